// Built-in validators

use crate::{ValidationError, Validator};
use girder_core::{TypeInfo, is_absent, numeric_value, text_value};
use once_cell::sync::Lazy;
use regex::Regex;
use std::any::Any;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$").unwrap()
});

static URL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").unwrap());

static UUID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .unwrap()
});

fn present(value: Option<&dyn Any>) -> Option<&dyn Any> {
    value.filter(|v| !is_absent(*v))
}

/// Fails when the field is missing, or is an empty string.
#[derive(Debug, Clone, Copy, Default)]
pub struct Required;

impl Validator for Required {
    fn validated_type(&self) -> TypeInfo {
        TypeInfo::any()
    }

    fn validate(&self, value: Option<&dyn Any>, field: &str) -> Result<(), ValidationError> {
        let missing = match present(value) {
            None => true,
            Some(v) => text_value(v).is_some_and(str::is_empty),
        };
        if missing {
            Err(ValidationError::new(field, format!("{} is required", field))
                .with_constraint("required"))
        } else {
            Ok(())
        }
    }

    fn name(&self) -> &'static str {
        "required"
    }
}

/// Character-count bounds on text. Absent values pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct Length {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl Length {
    pub fn min(min: usize) -> Self {
        Self { min: Some(min), max: None }
    }

    pub fn max(max: usize) -> Self {
        Self { min: None, max: Some(max) }
    }

    pub fn between(min: usize, max: usize) -> Self {
        Self { min: Some(min), max: Some(max) }
    }
}

impl Validator for Length {
    fn validated_type(&self) -> TypeInfo {
        TypeInfo::text()
    }

    fn validate(&self, value: Option<&dyn Any>, field: &str) -> Result<(), ValidationError> {
        let Some(text) = present(value).and_then(text_value) else {
            return Ok(());
        };
        let len = text.chars().count();

        if let Some(min) = self.min.filter(|min| len < *min) {
            return Err(ValidationError::new(
                field,
                format!("{} must be at least {} characters", field, min),
            )
            .with_constraint("length")
            .with_value(text));
        }
        if let Some(max) = self.max.filter(|max| len > *max) {
            return Err(ValidationError::new(
                field,
                format!("{} must be at most {} characters", field, max),
            )
            .with_constraint("length")
            .with_value(text));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "length"
    }
}

/// Inclusive bounds on any numeric type. Absent values pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct Range {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Range {
    pub fn min(min: f64) -> Self {
        Self { min: Some(min), max: None }
    }

    pub fn max(max: f64) -> Self {
        Self { min: None, max: Some(max) }
    }

    pub fn between(min: f64, max: f64) -> Self {
        Self { min: Some(min), max: Some(max) }
    }
}

impl Validator for Range {
    fn validated_type(&self) -> TypeInfo {
        TypeInfo::number()
    }

    fn validate(&self, value: Option<&dyn Any>, field: &str) -> Result<(), ValidationError> {
        let Some(number) = present(value).and_then(numeric_value) else {
            return Ok(());
        };

        let below = self.min.is_some_and(|min| number < min);
        let above = self.max.is_some_and(|max| number > max);
        if !below && !above {
            return Ok(());
        }

        let message = match (self.min, self.max) {
            (Some(min), Some(max)) => format!("{} must be between {} and {}", field, min, max),
            (Some(min), None) => format!("{} must be at least {}", field, min),
            (None, Some(max)) => format!("{} must be at most {}", field, max),
            (None, None) => unreachable!("unbounded range cannot fail"),
        };
        Err(ValidationError::new(field, message)
            .with_constraint("range")
            .with_value(number.to_string()))
    }

    fn name(&self) -> &'static str {
        "range"
    }
}

/// Text must match a regular expression. Absent values pass.
#[derive(Debug, Clone)]
pub struct Matches {
    pattern: Regex,
    constraint: &'static str,
    description: String,
}

impl Matches {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(pattern)?;
        Ok(Self {
            description: format!("match {}", pattern.as_str()),
            pattern,
            constraint: "matches",
        })
    }

    fn builtin(pattern: &Lazy<Regex>, constraint: &'static str, description: &str) -> Self {
        Self {
            pattern: Regex::clone(pattern),
            constraint,
            description: description.to_string(),
        }
    }

    pub fn email() -> Self {
        Self::builtin(&EMAIL_REGEX, "isEmail", "be a valid email")
    }

    pub fn url() -> Self {
        Self::builtin(&URL_REGEX, "isUrl", "be a valid URL")
    }

    pub fn uuid() -> Self {
        Self::builtin(&UUID_REGEX, "isUuid", "be a valid UUID")
    }
}

impl Validator for Matches {
    fn validated_type(&self) -> TypeInfo {
        TypeInfo::text()
    }

    fn validate(&self, value: Option<&dyn Any>, field: &str) -> Result<(), ValidationError> {
        match present(value).and_then(text_value) {
            Some(text) if !self.pattern.is_match(text) => Err(ValidationError::new(
                field,
                format!("{} must {}", field, self.description),
            )
            .with_constraint(self.constraint)
            .with_value(text)),
            _ => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        self.constraint
    }
}
