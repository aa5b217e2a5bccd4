// Core library for the Girder framework
// Request/response model, cookies, uploads, type metadata and the provider container

pub mod container;
pub mod cookie;
pub mod error;
pub mod form;
pub mod http;
pub mod types;

pub use container::*;
pub use cookie::*;
pub use error::*;
pub use form::*;
pub use http::*;
pub use types::*;
