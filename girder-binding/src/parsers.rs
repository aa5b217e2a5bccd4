//! String-to-value parsers for request parameters.
//!
//! Two flavours exist per type. The primitive flavour binds `T` and falls
//! back to `T::default()`; the boxed flavour binds `Option<T>` and falls back
//! to `None`. A missing value is silent in both. A malformed value records a
//! `parse` violation against the field and takes the same fallback, so the
//! handler still runs.
//!
//! ```
//! use girder_binding::parsers::ParamParsers;
//! use girder_core::TypeInfo;
//! use girder_validation::Validation;
//!
//! let parsers = ParamParsers::default();
//! let validation = Validation::new();
//!
//! let int = parsers.scalar(&TypeInfo::of::<i32>()).unwrap();
//! let value = int.parse("age", Some("notanumber"), &validation);
//! assert_eq!(*value.downcast::<i32>().unwrap(), 0);
//! assert!(validation.has_field_violation("age"));
//! ```

use crate::extractors::Value;
use girder_core::TypeInfo;
use girder_log::debug;
use girder_validation::{Validation, ValidationError};
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Parses one optional raw string.
pub trait ParamParser: Send + Sync + fmt::Debug {
    fn target_type(&self) -> TypeInfo;

    fn parse(&self, field: &str, raw: Option<&str>, validation: &Validation) -> Value;
}

/// Parses every value of a multi-valued field.
pub trait ArrayParser: Send + Sync + fmt::Debug {
    fn target_type(&self) -> TypeInfo;

    fn parse_all(&self, field: &str, raw: &[String], validation: &Validation) -> Value;
}

/// A type that can be read from a single request string.
pub trait ParseParam: Sized + Send + 'static {
    /// Name used in violation messages.
    const NAME: &'static str;

    fn parse_param(raw: &str) -> Option<Self>;
}

macro_rules! parse_from_str {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl ParseParam for $ty {
                const NAME: &'static str = $name;

                fn parse_param(raw: &str) -> Option<Self> {
                    raw.parse().ok()
                }
            }
        )*
    };
}

parse_from_str!(
    i8 => "integer",
    i16 => "integer",
    i32 => "integer",
    i64 => "integer",
    isize => "integer",
    u8 => "non-negative integer",
    u16 => "non-negative integer",
    u32 => "non-negative integer",
    u64 => "non-negative integer",
    usize => "non-negative integer",
    f32 => "number",
    f64 => "number",
    char => "single character",
);

impl ParseParam for bool {
    const NAME: &'static str = "boolean";

    fn parse_param(raw: &str) -> Option<Self> {
        if raw.eq_ignore_ascii_case("true") {
            Some(true)
        } else if raw.eq_ignore_ascii_case("false") {
            Some(false)
        } else {
            None
        }
    }
}

impl ParseParam for String {
    const NAME: &'static str = "string";

    fn parse_param(raw: &str) -> Option<Self> {
        Some(raw.to_string())
    }
}

fn parse_or_record<T: ParseParam>(field: &str, raw: Option<&str>, validation: &Validation) -> Option<T> {
    let raw = raw?;
    let parsed = T::parse_param(raw);
    if parsed.is_none() {
        debug!(target: "girder::binding", { field = field, target = T::NAME }, "parameter failed to parse");
        validation.add_violation(ValidationError::parse_failure(field, raw, T::NAME));
    }
    parsed
}

/// Binds `T`, defaulting on missing or malformed input.
pub struct PrimitiveParser<T>(PhantomData<fn() -> T>);

/// Binds `Option<T>`, `None` on missing or malformed input.
pub struct BoxedParser<T>(PhantomData<fn() -> T>);

/// Binds `Vec<T>`, each element with primitive semantics.
pub struct VecParser<T>(PhantomData<fn() -> T>);

macro_rules! parser_boilerplate {
    ($($name:ident),*) => {
        $(
            impl<T> $name<T> {
                pub fn new() -> Self {
                    Self(PhantomData)
                }
            }

            impl<T> Default for $name<T> {
                fn default() -> Self {
                    Self::new()
                }
            }

            impl<T> fmt::Debug for $name<T> {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}<{}>", stringify!($name), std::any::type_name::<T>())
                }
            }
        )*
    };
}

parser_boilerplate!(PrimitiveParser, BoxedParser, VecParser);

impl<T: ParseParam + Default> ParamParser for PrimitiveParser<T> {
    fn target_type(&self) -> TypeInfo {
        TypeInfo::of::<T>()
    }

    fn parse(&self, field: &str, raw: Option<&str>, validation: &Validation) -> Value {
        Box::new(parse_or_record::<T>(field, raw, validation).unwrap_or_default())
    }
}

impl<T: ParseParam> ParamParser for BoxedParser<T> {
    fn target_type(&self) -> TypeInfo {
        TypeInfo::of::<Option<T>>()
    }

    fn parse(&self, field: &str, raw: Option<&str>, validation: &Validation) -> Value {
        Box::new(parse_or_record::<T>(field, raw, validation))
    }
}

impl<T: ParseParam + Default> ArrayParser for VecParser<T> {
    fn target_type(&self) -> TypeInfo {
        TypeInfo::of::<Vec<T>>()
    }

    fn parse_all(&self, field: &str, raw: &[String], validation: &Validation) -> Value {
        let values: Vec<T> = raw
            .iter()
            .map(|r| parse_or_record::<T>(field, Some(r), validation).unwrap_or_default())
            .collect();
        Box::new(values)
    }
}

/// Parsers available to route compilation, keyed by target type.
#[derive(Debug, Clone)]
pub struct ParamParsers {
    scalar: HashMap<TypeId, Arc<dyn ParamParser>>,
    array: HashMap<TypeId, Arc<dyn ArrayParser>>,
}

impl Default for ParamParsers {
    /// Parsers for `bool`, `char`, every integer and float type, and `String`.
    fn default() -> Self {
        let mut parsers = Self::empty();
        parsers.register_type::<bool>();
        parsers.register_type::<char>();
        parsers.register_type::<i8>();
        parsers.register_type::<i16>();
        parsers.register_type::<i32>();
        parsers.register_type::<i64>();
        parsers.register_type::<isize>();
        parsers.register_type::<u8>();
        parsers.register_type::<u16>();
        parsers.register_type::<u32>();
        parsers.register_type::<u64>();
        parsers.register_type::<usize>();
        parsers.register_type::<f32>();
        parsers.register_type::<f64>();
        parsers.register_type::<String>();
        parsers
    }
}

impl ParamParsers {
    pub fn empty() -> Self {
        Self {
            scalar: HashMap::new(),
            array: HashMap::new(),
        }
    }

    /// Register a scalar parser, replacing any for the same target type.
    pub fn register<P: ParamParser + 'static>(&mut self, parser: P) {
        self.scalar.insert(parser.target_type().id(), Arc::new(parser));
    }

    pub fn register_array<P: ArrayParser + 'static>(&mut self, parser: P) {
        self.array.insert(parser.target_type().id(), Arc::new(parser));
    }

    /// Register the primitive, boxed and array parsers of `T`.
    pub fn register_type<T: ParseParam + Default>(&mut self) {
        self.register(PrimitiveParser::<T>::new());
        self.register(BoxedParser::<T>::new());
        self.register_array(VecParser::<T>::new());
    }

    pub fn scalar(&self, target: &TypeInfo) -> Option<Arc<dyn ParamParser>> {
        self.scalar.get(&target.id()).cloned()
    }

    pub fn array(&self, target: &TypeInfo) -> Option<Arc<dyn ArrayParser>> {
        self.array.get(&target.id()).cloned()
    }
}
