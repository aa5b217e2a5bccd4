// Extractors reading one named field of the request

use super::{ArgumentExtractor, Value};
use crate::context::Context;
use crate::error::ExtractError;
use girder_core::TypeInfo;
use std::fmt;
use std::marker::PhantomData;

macro_rules! field_extractor {
    ($(#[$doc:meta])* $name:ident, $ty:ty, |$ctx:ident, $field:ident| $body:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name {
            field: String,
        }

        impl $name {
            pub fn new(field: impl Into<String>) -> Self {
                Self { field: field.into() }
            }
        }

        impl ArgumentExtractor for $name {
            fn extract(&self, $ctx: &Context) -> Result<Option<Value>, ExtractError> {
                let $field = self.field.as_str();
                Ok($body.map(|v| Box::new(v) as Value))
            }

            fn extracted_type(&self) -> TypeInfo {
                TypeInfo::of::<$ty>()
            }

            fn field_name(&self) -> Option<&str> {
                Some(&self.field)
            }
        }
    };
}

field_extractor!(
    /// A path parameter.
    PathParamExtractor,
    String,
    |context, field| context.path_parameter(field).map(str::to_string)
);

field_extractor!(
    /// The first value of a query or form parameter.
    ParamExtractor,
    String,
    |context, field| context.parameter(field).map(str::to_string)
);

field_extractor!(
    /// Every value of a query or form parameter. Empty when absent.
    ParamsExtractor,
    Vec<String>,
    |context, field| Some(context.parameter_values(field).to_vec())
);

field_extractor!(
    /// The first value of a header.
    HeaderExtractor,
    String,
    |context, field| context.header(field).map(str::to_string)
);

field_extractor!(
    /// Every value of a header. Empty when absent.
    HeadersExtractor,
    Vec<String>,
    |context, field| Some(context.headers(field).to_vec())
);

field_extractor!(
    /// A value stored in the session.
    SessionParamExtractor,
    String,
    |context, field| context.session().get(field)
);

/// A typed request attribute, usually set by a filter.
///
/// When `optional`, a missing attribute binds as `None` and the extracted
/// type is `Option<T>`. An attribute of the wrong type is an error.
pub struct AttributeExtractor<T> {
    field: String,
    optional: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Clone + Send + Sync + 'static> AttributeExtractor<T> {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            optional: false,
            _marker: PhantomData,
        }
    }

    pub fn optional(field: impl Into<String>) -> Self {
        Self {
            optional: true,
            ..Self::new(field)
        }
    }
}

impl<T> fmt::Debug for AttributeExtractor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeExtractor")
            .field("field", &self.field)
            .field("type", &std::any::type_name::<T>())
            .field("optional", &self.optional)
            .finish()
    }
}

impl<T: Clone + Send + Sync + 'static> ArgumentExtractor for AttributeExtractor<T> {
    fn extract(&self, context: &Context) -> Result<Option<Value>, ExtractError> {
        let value = context.attribute::<T>(&self.field);
        if value.is_none() && context.has_attribute(&self.field) {
            return Err(ExtractError::Attribute {
                name: self.field.clone(),
                expected: std::any::type_name::<T>(),
            });
        }

        if self.optional {
            Ok(Some(Box::new(value)))
        } else {
            Ok(value.map(|v| Box::new(v) as Value))
        }
    }

    fn extracted_type(&self) -> TypeInfo {
        if self.optional {
            TypeInfo::of::<Option<T>>()
        } else {
            TypeInfo::of::<T>()
        }
    }

    fn field_name(&self) -> Option<&str> {
        Some(&self.field)
    }
}
