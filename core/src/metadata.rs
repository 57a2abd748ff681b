//! Parsed script metadata.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::value::Value;

/// Ordered key/value metadata declared in a script header.
///
/// Keys keep the position of their first assignment; re-assigning a key
/// replaces its value in place. Equality ignores key order.
///
/// The conventional keys have typed accessors: [`command`](Self::command),
/// [`aliases`](Self::aliases), [`author`](Self::author),
/// [`description`](Self::description) and
/// [`dependencies`](Self::dependencies).
///
/// # Examples
///
/// ```
/// use act_core::{ScriptMetadata, Value};
///
/// let mut meta = ScriptMetadata::new();
/// meta.insert("command", Value::from("weather"));
/// meta.insert("aliases", Value::from(vec!["wttr"]));
/// assert!(meta.matches("weather"));
/// assert!(meta.matches("wttr"));
/// assert!(!meta.matches("rain"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptMetadata {
    entries: Vec<(String, Value)>,
}

impl ScriptMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key`, replacing an existing value without moving it.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterates entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The command name, when declared as a non-empty string.
    ///
    /// Scripts without one are not resolvable, listable or linkable.
    pub fn command(&self) -> Option<&str> {
        self.string("command").filter(|s| !s.is_empty())
    }

    /// String entries of the `aliases` list. Non-string items are ignored.
    pub fn aliases(&self) -> Vec<&str> {
        self.string_list("aliases")
    }

    pub fn author(&self) -> Option<&str> {
        self.string("author")
    }

    pub fn description(&self) -> Option<&str> {
        self.string("description")
    }

    pub fn dependencies(&self) -> Vec<&str> {
        self.string_list("dependencies")
    }

    /// Returns `true` if `token` equals the command or one of the aliases.
    pub fn matches(&self, token: &str) -> bool {
        self.command() == Some(token) || self.aliases().contains(&token)
    }

    fn string(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    fn string_list(&self, key: &str) -> Vec<&str> {
        self.get(key)
            .and_then(Value::as_list)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

impl PartialEq for ScriptMetadata {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl Serialize for ScriptMetadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weather() -> ScriptMetadata {
        let mut meta = ScriptMetadata::new();
        meta.insert("command", Value::from("weather"));
        meta.insert(
            "aliases",
            Value::List(vec![Value::from("wttr"), Value::Int(3), Value::from("temp")]),
        );
        meta.insert("author", Value::from("jane"));
        meta
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut meta = weather();
        meta.insert("command", Value::from("forecast"));
        assert_eq!(meta.len(), 3);
        assert_eq!(meta.iter().next().map(|(k, _)| k), Some("command"));
        assert_eq!(meta.command(), Some("forecast"));
    }

    #[test]
    fn test_aliases_skip_non_strings() {
        assert_eq!(weather().aliases(), vec!["wttr", "temp"]);
    }

    #[test]
    fn test_command_requires_non_empty_string() {
        let mut meta = ScriptMetadata::new();
        meta.insert("command", Value::Int(5));
        assert_eq!(meta.command(), None);
        meta.insert("command", Value::from(""));
        assert_eq!(meta.command(), None);
        assert!(meta.contains_key("command"));
    }

    #[test]
    fn test_missing_lists_are_empty() {
        let meta = ScriptMetadata::new();
        assert!(meta.aliases().is_empty());
        assert!(meta.dependencies().is_empty());
        assert!(!meta.matches("anything"));
    }

    #[test]
    fn test_equality_ignores_order() {
        let mut a = ScriptMetadata::new();
        a.insert("x", Value::Int(1));
        a.insert("y", Value::Int(2));
        let mut b = ScriptMetadata::new();
        b.insert("y", Value::Int(2));
        b.insert("x", Value::Int(1));
        assert_eq!(a, b);
        b.insert("x", Value::Int(9));
        assert_ne!(a, b);
    }

    #[test]
    fn test_serializes_as_ordered_map() {
        let json = serde_json::to_string(&weather()).unwrap();
        assert_eq!(
            json,
            r#"{"command":"weather","aliases":["wttr",3,"temp"],"author":"jane"}"#
        );
    }
}
