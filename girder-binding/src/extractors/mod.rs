//! Argument extractors.
//!
//! An extractor pulls one handler argument out of a [`Context`]. Route
//! compilation picks one per parameter and may wrap it to parse or validate
//! what it produces; at request time the chain is only ever executed.
//!
//! Values travel type-erased as [`Value`]. `Ok(None)` means the request had
//! nothing for this argument, which is not an error by itself.

use crate::context::Context;
use crate::error::ExtractError;
use girder_core::TypeInfo;
use std::any::Any;
use std::fmt;

mod body;
mod request;
mod statics;
mod upload;
mod wrappers;

pub use body::BodyAsExtractor;
pub use request::{
    AttributeExtractor, HeaderExtractor, HeadersExtractor, ParamExtractor, ParamsExtractor,
    PathParamExtractor, SessionParamExtractor,
};
pub use statics::{ContextExtractor, FlashExtractor, SessionExtractor, ValidationExtractor};
pub use upload::{
    FileExtractor, FileItemExtractor, FileItemsExtractor, FilesExtractor, InputStreamExtractor,
    InputStreamsExtractor,
};
pub use wrappers::{OptionalWrapperExtractor, ParsingWrapperExtractor, ValidatingWrapperExtractor};

/// A type-erased argument value.
pub type Value = Box<dyn Any + Send>;

/// Owned extractor trait object.
pub type BoxedExtractor = Box<dyn ArgumentExtractor>;

/// Produces one handler argument from a request.
pub trait ArgumentExtractor: Send + Sync + fmt::Debug {
    fn extract(&self, context: &Context) -> Result<Option<Value>, ExtractError>;

    /// The type of every value [`ArgumentExtractor::extract`] returns.
    fn extracted_type(&self) -> TypeInfo;

    /// The request field this extractor reads, if it reads exactly one.
    fn field_name(&self) -> Option<&str>;
}

/// View a value as `&dyn Any` for validators.
pub(crate) fn as_any(value: &Option<Value>) -> Option<&dyn Any> {
    value.as_ref().map(|v| {
        let v: &dyn Any = &**v;
        v
    })
}

pub(crate) use statics::for_type as static_extractor_for;
pub(crate) use upload::for_type as upload_extractor_for;
