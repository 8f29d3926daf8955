//! Recurrent Gatekeeper
//!
//! Decides whether a model response is usable before it reaches the
//! accumulated state.
//!
//! The Gatekeeper provides:
//! - JSON extraction from free-form model text (fenced or bare)
//! - Structural validation against an `OutputSchema`, collecting every
//!   violation with its JSON path
//! - The prefix-extension check used for cumulative summaries
//!
//! # Examples
//!
//! ```
//! use recurrent_domain::OutputSchema;
//! use recurrent_gatekeeper::Gatekeeper;
//!
//! let schema = OutputSchema::object_of_strings(&["summary"]);
//! let gatekeeper = Gatekeeper::new(Some(schema));
//!
//! let value = gatekeeper
//!     .validate("```json\n{\"summary\": \"Chapter one.\"}\n```")
//!     .unwrap();
//! assert_eq!(value["summary"], "Chapter one.");
//!
//! assert!(gatekeeper.validate(r#"{"title": "no summary"}"#).is_err());
//! ```

#![warn(missing_docs)]

mod error;
mod extract;
mod validator;

pub use error::{SchemaViolation, ValidationFailure};
pub use extract::extract_json;
pub use validator::{check_prefix_extension, Gatekeeper, PrefixViolation};
