//! Controller argument binding for Girder.
//!
//! Handlers are ordinary methods. Their parameters are described with
//! annotations, and a [`RouteCompiler`] turns each one into a
//! [`ControllerMethodInvoker`] once at startup. Per request the invoker runs
//! a fixed chain of extractors against a [`Context`] and calls the method.
//!
//! - [`annotation`] says where a parameter comes from and how to check it
//! - [`extractors`] read values out of the request
//! - [`parsers`] turn request strings into typed values
//! - [`compiler`] picks, wraps and validates extractors per parameter
//! - [`invoker`] runs them and calls the handler
//!
//! # Example
//!
//! ```
//! use girder_binding::prelude::*;
//! use girder_core::HttpRequest;
//! use girder_session::{SessionConfig, SessionManager};
//! use girder_validation::Range;
//!
//! struct Orders;
//!
//! impl Orders {
//!     fn page(&self, page: u32, validation: Validation) -> String {
//!         if validation.has_violations() {
//!             return "bad request".into();
//!         }
//!         format!("page {}", page)
//!     }
//! }
//!
//! let invoker = RouteCompiler::new()
//!     .compile(
//!         HandlerMethod::new("Orders::page", Orders::page)
//!             .annotate(0, Param::named("page"))
//!             .annotate(0, Validate::with(Range::min(1.0))),
//!     )
//!     .unwrap();
//!
//! let manager = SessionManager::new(SessionConfig::new(SessionConfig::generate_secret()).unwrap()).unwrap();
//!
//! let context = Context::open(HttpRequest::get("/orders?page=3"), &manager);
//! assert_eq!(invoker.invoke(&Orders, &context).unwrap(), "page 3");
//!
//! let context = Context::open(HttpRequest::get("/orders?page=zero"), &manager);
//! assert_eq!(invoker.invoke(&Orders, &context).unwrap(), "bad request");
//! ```

pub mod annotation;
pub mod compiler;
pub mod context;
pub mod error;
pub mod extractors;
pub mod handler;
pub mod invoker;
pub mod parsers;

pub use annotation::{Annotation, ExtractorFactory, Strategy};
pub use compiler::{BodyParsers, OptionalTypes, RouteCompiler};
pub use context::Context;
pub use error::{BindingResult, ConfigurationError, ConfigurationErrorKind, ExtractError, InvocationError};
pub use extractors::{ArgumentExtractor, BoxedExtractor, Value};
pub use handler::{ArgumentError, Handler, HandlerMethod};
pub use invoker::ControllerMethodInvoker;
pub use parsers::{ArrayParser, ParamParser, ParamParsers, ParseParam};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::annotation::{
        Attribute, Header, Headers, Param, Params, PathParam, SessionParam, Validate,
    };
    pub use crate::compiler::RouteCompiler;
    pub use crate::context::Context;
    pub use crate::error::{ConfigurationError, InvocationError};
    pub use crate::handler::HandlerMethod;
    pub use crate::invoker::ControllerMethodInvoker;
    pub use girder_session::{FlashScope, Session};
    pub use girder_validation::Validation;
}
