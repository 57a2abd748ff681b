//! Literal values stored in script metadata.

use std::fmt;

use serde::Serialize;

/// A literal read from a script header.
///
/// Tuples in the header are read as lists. Integers wider than `i64` keep
/// their decimal text in [`Value::BigInt`] and serialize as JSON strings.
///
/// # Examples
///
/// ```
/// use act_core::Value;
///
/// let aliases = Value::from(vec!["wttr", "weather"]);
/// assert_eq!(aliases.to_literal_string(), r#"["wttr", "weather"]"#);
/// assert_eq!(aliases.to_string(), "['wttr', 'weather']");
/// assert_eq!(Value::from("jane").to_string(), "jane");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Str(String),
    Int(i64),
    /// Decimal digits, with a leading `-` when negative.
    BigInt(String),
    Float(f64),
    Bool(bool),
    None,
    List(Vec<Value>),
}

impl Value {
    /// Returns the string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the list items, if this is a list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Short type name used in validation messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Int(_) | Value::BigInt(_) => "integer",
            Value::Float(_) => "float",
            Value::Bool(_) => "boolean",
            Value::None => "None",
            Value::List(_) => "list",
        }
    }

    /// Renders the value in header syntax, suitable for re-parsing.
    pub fn to_literal_string(&self) -> String {
        let mut out = String::new();
        self.write_literal(&mut out, '"');
        out
    }

    fn write_literal(&self, out: &mut String, quote: char) {
        match self {
            Value::Str(s) => write_quoted(out, s, quote),
            Value::Int(n) => out.push_str(&n.to_string()),
            Value::BigInt(digits) => out.push_str(digits),
            Value::Float(f) => out.push_str(&format_float(*f)),
            Value::Bool(true) => out.push_str("True"),
            Value::Bool(false) => out.push_str("False"),
            Value::None => out.push_str("None"),
            Value::List(items) => {
                out.push('[');
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        out.push_str(", ");
                    }
                    item.write_literal(out, quote);
                }
                out.push(']');
            }
        }
    }
}

fn format_float(f: f64) -> String {
    if f.is_nan() {
        // No literal spelling exists; rendered so that it reads as a value.
        "float('nan')".to_string()
    } else if f.is_infinite() {
        let spelled = if f > 0.0 { "1e999" } else { "-1e999" };
        spelled.to_string()
    } else {
        format!("{f:?}")
    }
}

fn write_quoted(out: &mut String, s: &str, quote: char) {
    out.push(quote);
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c == '\x7f' => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
}

/// Top-level strings print bare; everything else prints in the single-quoted
/// style used when listing metadata.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            other => {
                let mut out = String::new();
                other.write_literal(&mut out, '\'');
                f.write_str(&out)
            }
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_rendering() {
        assert_eq!(Value::from("a\"b").to_literal_string(), r#""a\"b""#);
        assert_eq!(Value::Int(-3).to_literal_string(), "-3");
        assert_eq!(Value::Float(1.0).to_literal_string(), "1.0");
        assert_eq!(Value::Bool(true).to_literal_string(), "True");
        assert_eq!(Value::None.to_literal_string(), "None");
        assert_eq!(
            Value::List(vec![Value::Int(1), Value::from("x")]).to_literal_string(),
            r#"[1, "x"]"#
        );
    }

    #[test]
    fn test_display_matches_listing_style() {
        assert_eq!(Value::from(vec!["requests<3"]).to_string(), "['requests<3']");
        assert_eq!(Value::Bool(false).to_string(), "False");
        assert_eq!(Value::from("plain").to_string(), "plain");
    }

    #[test]
    fn test_serializes_untagged() {
        let value = Value::List(vec![Value::from("a"), Value::Int(2), Value::None]);
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"["a",2,null]"#);
    }

    #[test]
    fn test_big_integers_render_as_digits() {
        let big = Value::BigInt("-99999999999999999999".into());
        assert_eq!(big.to_literal_string(), "-99999999999999999999");
        assert_eq!(big.type_name(), "integer");
        assert_eq!(serde_json::to_string(&big).unwrap(), r#""-99999999999999999999""#);
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert_eq!(Value::Int(1).as_str(), None);
        assert_eq!(Value::from(vec!["a"]).as_list().map(<[Value]>::len), Some(1));
        assert_eq!(Value::Float(0.5).type_name(), "float");
    }
}
