//! Script header parsing and shared types for the `act` script manager.
//!
//! Scripts managed by `act` carry a metadata block in their leading comment
//! lines:
//!
//! ```text
//! # /// script
//! # command = "weather"
//! # aliases = ["weather", "wttr"]
//! # author = "jane"
//! # dependencies = ["requests<3"]
//! # ///
//! ```
//!
//! This crate provides:
//!
//! - [`parse_header`]: extracts and evaluates the block into
//!   [`ScriptMetadata`]. Values are restricted to literals ([`Value`]); no
//!   code is ever executed.
//! - [`render_header`]: the inverse, used when creating scripts.
//! - [`Namespace`] and [`Identifier`]: where a script lives and how users
//!   refer to it (`weather`, `community:weather`).
//! - [`validate_metadata`]: required-field checks used by the installer.
//!
//! # Example
//!
//! ```
//! use act_core::*;
//!
//! let script = "# /// script\n# command = \"build\"\n# aliases = [\"b\"]\n# ///\nprint('building')\n";
//! let meta = parse_header(script).unwrap();
//! assert!(meta.matches("b"));
//!
//! let id = Identifier::parse("local:b");
//! assert_eq!(id.search_order(), &[Namespace::Local]);
//! assert!(meta.matches(id.token()));
//! ```

mod header;
mod lexer;
mod metadata;
mod namespace;
mod validate;
mod value;

pub use header::{HEADER_DELIMITER, ParseError, parse_header, render_header};
pub use lexer::MAX_NESTING;
pub use metadata::ScriptMetadata;
pub use namespace::{Identifier, Namespace, UnknownNamespace};
pub use validate::{
    INSTALL_REQUIRED_FIELDS, ValidationError, is_valid_command_name, validate_metadata,
};
pub use value::Value;
