//! Validation for Girder handlers
//!
//! Parameter binding never aborts a request because of bad input. Problems
//! are recorded into a per-request [`Validation`] sink, keyed by field name,
//! and the handler decides what to do with them.
//!
//! [`Validator`]s are attached to handler parameters. Each declares the type
//! it inspects through [`Validator::validated_type`], which lets route
//! compilation decide whether it runs on the raw request string or on the
//! parsed value.
//!
//! ```
//! use girder_validation::{Length, Validation, Validator};
//! use std::any::Any;
//!
//! let validation = Validation::new();
//! let name: &dyn Any = &"al".to_string();
//!
//! let ok = Length::min(3).check(Some(name), "name", &validation);
//! assert!(!ok);
//! assert!(validation.has_field_violation("name"));
//! ```

pub mod errors;
pub mod traits;
pub mod validation;
pub mod validators;

pub use errors::*;
pub use traits::*;
pub use validation::*;
pub use validators::*;
