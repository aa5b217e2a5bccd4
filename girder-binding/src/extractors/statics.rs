// Extractors for the per-request handles themselves

use super::{ArgumentExtractor, Value};
use crate::context::Context;
use crate::error::ExtractError;
use girder_core::TypeInfo;
use girder_session::{FlashScope, Session};
use girder_validation::Validation;

macro_rules! static_extractor {
    ($(#[$doc:meta])* $name:ident, $ty:ty, |$ctx:ident| $body:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl ArgumentExtractor for $name {
            fn extract(&self, $ctx: &Context) -> Result<Option<Value>, ExtractError> {
                Ok(Some(Box::new($body)))
            }

            fn extracted_type(&self) -> TypeInfo {
                TypeInfo::of::<$ty>()
            }

            fn field_name(&self) -> Option<&str> {
                None
            }
        }
    };
}

static_extractor!(
    /// The request context.
    ContextExtractor,
    Context,
    |context| context.clone()
);

static_extractor!(
    /// The request's session.
    SessionExtractor,
    Session,
    |context| context.session().clone()
);

static_extractor!(
    /// The request's flash scope.
    FlashExtractor,
    FlashScope,
    |context| context.flash().clone()
);

static_extractor!(
    /// The request's validation sink.
    ValidationExtractor,
    Validation,
    |context| context.validation().clone()
);

/// The extractor bound to a parameter purely by its declared type.
pub(crate) fn for_type(declared: &TypeInfo) -> Option<super::BoxedExtractor> {
    if declared.is::<Context>() {
        Some(Box::new(ContextExtractor))
    } else if declared.is::<Session>() {
        Some(Box::new(SessionExtractor))
    } else if declared.is::<FlashScope>() {
        Some(Box::new(FlashExtractor))
    } else if declared.is::<Validation>() {
        Some(Box::new(ValidationExtractor))
    } else {
        None
    }
}
