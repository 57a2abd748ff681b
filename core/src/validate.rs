//! Metadata validation.
//!
//! Checks that a parsed header declares the fields a workflow depends on and
//! that the command can be used as a shim file name.
//!
//! # Examples
//!
//! ```
//! use act_core::*;
//!
//! let meta = parse_header("# /// script\n# command = \"weather\"\n# ///\n").unwrap();
//! let errors = validate_metadata(&meta, INSTALL_REQUIRED_FIELDS);
//! assert_eq!(errors, vec![ValidationError::MissingField("author".into())]);
//! ```

use thiserror::Error;

use crate::metadata::ScriptMetadata;

/// Fields an installed community script must declare.
pub const INSTALL_REQUIRED_FIELDS: &[&str] = &["command", "author"];

/// Metadata validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is absent.
    #[error("missing required field '{0}'")]
    MissingField(String),

    /// A required field is present but not a string.
    #[error("field '{field}' must be a string, found {found}")]
    NotAString { field: String, found: &'static str },

    /// The command cannot be used as a file name.
    #[error("invalid command name '{0}'")]
    InvalidCommand(String),
}

/// Validates that every field in `required` is a string, and that the
/// command (if present) is usable as a shim name.
///
/// Validation stops at the first problem, so at most one error is returned.
pub fn validate_metadata(metadata: &ScriptMetadata, required: &[&str]) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for field in required {
        match metadata.get(field) {
            None => {
                errors.push(ValidationError::MissingField(field.to_string()));
                return errors;
            }
            Some(value) if value.as_str().is_none() => {
                errors.push(ValidationError::NotAString {
                    field: field.to_string(),
                    found: value.type_name(),
                });
                return errors;
            }
            Some(_) => {}
        }
    }

    if let Some(command) = metadata.get("command").and_then(|v| v.as_str()) {
        if !is_valid_command_name(command) {
            errors.push(ValidationError::InvalidCommand(command.to_string()));
        }
    }

    errors
}

/// Returns `true` if `name` can be used as a single file name in the shim
/// directory.
///
/// `:` is refused: a shim passes its name back as an identifier, where
/// `local:foo` would name `foo`.
///
/// # Examples
///
/// ```
/// use act_core::is_valid_command_name;
///
/// assert!(is_valid_command_name("wttr.in"));
/// assert!(!is_valid_command_name("../escape"));
/// assert!(!is_valid_command_name(".."));
/// assert!(!is_valid_command_name(""));
/// assert!(!is_valid_command_name("local:foo"));
/// ```
pub fn is_valid_command_name(name: &str) -> bool {
    !name.trim().is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0', ':'])
}
