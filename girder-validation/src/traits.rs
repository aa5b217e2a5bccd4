// Validation traits

use crate::{Validation, ValidationError};
use girder_core::TypeInfo;
use std::any::Any;
use std::fmt;

/// A rule applied to one bound handler parameter.
///
/// `value` is `None` when the request carried nothing for the field.
/// Validators other than "required" rules should accept absent values.
pub trait Validator: Send + Sync + fmt::Debug {
    /// The type this validator knows how to inspect.
    fn validated_type(&self) -> TypeInfo;

    fn validate(&self, value: Option<&dyn Any>, field: &str) -> Result<(), ValidationError>;

    fn name(&self) -> &'static str;

    /// Run the validator and record a failure into `sink`.
    /// Returns whether the value passed.
    fn check(&self, value: Option<&dyn Any>, field: &str, sink: &Validation) -> bool {
        match self.validate(value, field) {
            Ok(()) => true,
            Err(error) => {
                sink.add_violation(error);
                false
            }
        }
    }
}

/// Adapter turning a typed closure into a [`Validator`].
///
/// ```
/// use girder_validation::{FnValidator, ValidationError, Validator};
/// use std::any::Any;
///
/// let even = FnValidator::new("even", |n: &i64, field: &str| {
///     if n % 2 == 0 {
///         Ok(())
///     } else {
///         Err(ValidationError::new(field, "must be even"))
///     }
/// });
/// let three: &dyn Any = &3i64;
/// assert!(even.validate(Some(three), "n").is_err());
/// ```
pub struct FnValidator<T, F> {
    name: &'static str,
    rule: F,
    _marker: std::marker::PhantomData<fn(&T)>,
}

impl<T, F> FnValidator<T, F>
where
    T: 'static,
    F: Fn(&T, &str) -> Result<(), ValidationError> + Send + Sync,
{
    pub fn new(name: &'static str, rule: F) -> Self {
        Self {
            name,
            rule,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T, F> fmt::Debug for FnValidator<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnValidator").field("name", &self.name).finish()
    }
}

impl<T, F> Validator for FnValidator<T, F>
where
    T: 'static,
    F: Fn(&T, &str) -> Result<(), ValidationError> + Send + Sync,
{
    fn validated_type(&self) -> TypeInfo {
        TypeInfo::of::<T>()
    }

    fn validate(&self, value: Option<&dyn Any>, field: &str) -> Result<(), ValidationError> {
        match value.and_then(|v| v.downcast_ref::<T>()) {
            Some(v) => (self.rule)(v, field),
            None => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
