// Extractors that adapt or check another extractor's output

use super::{ArgumentExtractor, BoxedExtractor, Value, as_any};
use crate::context::Context;
use crate::error::ExtractError;
use crate::parsers::{ArrayParser, ParamParser};
use girder_core::TypeInfo;
use girder_log::trace;
use girder_validation::Validator;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Turns the inner extractor's `T` into `Option<T>`, so a missing value
/// binds as `None` instead of failing the call.
pub struct OptionalWrapperExtractor<T> {
    inner: BoxedExtractor,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + 'static> OptionalWrapperExtractor<T> {
    pub fn new(inner: BoxedExtractor) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for OptionalWrapperExtractor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OptionalWrapperExtractor").field(&self.inner).finish()
    }
}

impl<T: Send + 'static> ArgumentExtractor for OptionalWrapperExtractor<T> {
    fn extract(&self, context: &Context) -> Result<Option<Value>, ExtractError> {
        let wrapped: Value = match self.inner.extract(context)? {
            // A mistyped value is passed on untouched so the invoker reports it.
            Some(value) => match value.downcast::<T>() {
                Ok(value) => Box::new(Some(*value)),
                Err(value) => value,
            },
            None => Box::new(None::<T>),
        };
        Ok(Some(wrapped))
    }

    fn extracted_type(&self) -> TypeInfo {
        TypeInfo::of::<Option<T>>()
    }

    fn field_name(&self) -> Option<&str> {
        self.inner.field_name()
    }
}

#[derive(Debug, Clone)]
enum Parser {
    Scalar(Arc<dyn ParamParser>),
    Array(Arc<dyn ArrayParser>),
}

/// Parses the raw string (or strings) of a field-bound extractor.
#[derive(Debug)]
pub struct ParsingWrapperExtractor {
    inner: BoxedExtractor,
    field: String,
    parser: Parser,
}

impl ParsingWrapperExtractor {
    /// Wrap an extractor producing `String`.
    pub fn scalar(inner: BoxedExtractor, parser: Arc<dyn ParamParser>) -> Self {
        Self::build(inner, Parser::Scalar(parser))
    }

    /// Wrap an extractor producing `Vec<String>`.
    pub fn array(inner: BoxedExtractor, parser: Arc<dyn ArrayParser>) -> Self {
        Self::build(inner, Parser::Array(parser))
    }

    fn build(inner: BoxedExtractor, parser: Parser) -> Self {
        let field = inner.field_name().unwrap_or_default().to_string();
        Self { inner, field, parser }
    }
}

impl ArgumentExtractor for ParsingWrapperExtractor {
    fn extract(&self, context: &Context) -> Result<Option<Value>, ExtractError> {
        let raw = self.inner.extract(context)?;
        let validation = context.validation();

        let parsed = match self.parser {
            Parser::Scalar(ref parser) => {
                let raw = raw.as_ref().and_then(|v| v.downcast_ref::<String>());
                parser.parse(&self.field, raw.map(String::as_str), validation)
            }
            Parser::Array(ref parser) => {
                let raw = raw.as_ref().and_then(|v| v.downcast_ref::<Vec<String>>());
                parser.parse_all(&self.field, raw.map(Vec::as_slice).unwrap_or(&[]), validation)
            }
        };
        Ok(Some(parsed))
    }

    fn extracted_type(&self) -> TypeInfo {
        match self.parser {
            Parser::Scalar(ref parser) => parser.target_type(),
            Parser::Array(ref parser) => parser.target_type(),
        }
    }

    fn field_name(&self) -> Option<&str> {
        Some(&self.field)
    }
}

/// Runs validators over the inner extractor's value.
///
/// Validators run in order until the field has a violation, including one
/// recorded earlier by a parser. The value is returned whether or not it
/// passed: a primitive parameter must still receive something, and the
/// handler inspects [`girder_validation::Validation`] to decide.
#[derive(Debug)]
pub struct ValidatingWrapperExtractor {
    inner: BoxedExtractor,
    field: String,
    validators: Vec<Arc<dyn Validator>>,
}

impl ValidatingWrapperExtractor {
    pub fn new(inner: BoxedExtractor, validators: Vec<Arc<dyn Validator>>) -> Self {
        let field = inner.field_name().unwrap_or("body").to_string();
        Self {
            inner,
            field,
            validators,
        }
    }
}

impl ArgumentExtractor for ValidatingWrapperExtractor {
    fn extract(&self, context: &Context) -> Result<Option<Value>, ExtractError> {
        let value = self.inner.extract(context)?;
        let validation = context.validation();

        for validator in &self.validators {
            if validation.has_field_violation(&self.field) {
                break;
            }
            if !validator.check(as_any(&value), &self.field, validation) {
                trace!(target: "girder::binding", { field = self.field, validator = validator.name() }, "validation failed");
            }
        }
        Ok(value)
    }

    fn extracted_type(&self) -> TypeInfo {
        self.inner.extracted_type()
    }

    fn field_name(&self) -> Option<&str> {
        self.inner.field_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::{ParamExtractor, ParamsExtractor};
    use crate::parsers::ParamParsers;
    use girder_core::HttpRequest;
    use girder_session::{SessionConfig, SessionManager};
    use girder_validation::{Length, Range, Required};

    fn context(request: HttpRequest) -> Context {
        let manager = SessionManager::new(
            SessionConfig::new("0123456789abcdef0123456789abcdef").unwrap(),
        )
        .unwrap();
        Context::open(request, &manager)
    }

    fn parse_int(field: &str) -> BoxedExtractor {
        let parser = ParamParsers::default().scalar(&TypeInfo::of::<i32>()).unwrap();
        Box::new(ParsingWrapperExtractor::scalar(
            Box::new(ParamExtractor::new(field)),
            parser,
        ))
    }

    #[test]
    fn test_optional_wrapper() {
        let ctx = context(HttpRequest::get("/?q=rust"));
        let present = OptionalWrapperExtractor::<String>::new(Box::new(ParamExtractor::new("q")));
        let value = present.extract(&ctx).unwrap().unwrap();
        assert_eq!(*value.downcast::<Option<String>>().unwrap(), Some("rust".to_string()));

        let absent = OptionalWrapperExtractor::<String>::new(Box::new(ParamExtractor::new("x")));
        let value = absent.extract(&ctx).unwrap().unwrap();
        assert_eq!(*value.downcast::<Option<String>>().unwrap(), None);
        assert!(absent.extracted_type().is::<Option<String>>());
        assert_eq!(absent.field_name(), Some("x"));
    }

    #[test]
    fn test_parsing_wrapper_scalar() {
        let ctx = context(HttpRequest::get("/?age=notanumber"));
        let extractor = parse_int("age");
        assert!(extractor.extracted_type().is::<i32>());

        let value = extractor.extract(&ctx).unwrap().unwrap();
        assert_eq!(*value.downcast::<i32>().unwrap(), 0);
        assert!(ctx.validation().has_field_violation("age"));
    }

    #[test]
    fn test_parsing_wrapper_array() {
        let ctx = context(HttpRequest::get("/?id=1&id=2"));
        let parser = ParamParsers::default().array(&TypeInfo::of::<Vec<u8>>()).unwrap();
        let extractor = ParsingWrapperExtractor::array(Box::new(ParamsExtractor::new("id")), parser);
        let value = extractor.extract(&ctx).unwrap().unwrap();
        assert_eq!(*value.downcast::<Vec<u8>>().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_validating_wrapper_returns_invalid_value() {
        let ctx = context(HttpRequest::get("/?name=al"));
        let extractor = ValidatingWrapperExtractor::new(
            Box::new(ParamExtractor::new("name")),
            vec![Arc::new(Length::min(3))],
        );
        let value = extractor.extract(&ctx).unwrap().unwrap();
        assert_eq!(*value.downcast::<String>().unwrap(), "al");
        assert_eq!(ctx.validation().field_violations("name")[0].constraint, "length");
    }

    #[test]
    fn test_validating_wrapper_stops_at_first_violation() {
        let ctx = context(HttpRequest::get("/"));
        let extractor = ValidatingWrapperExtractor::new(
            Box::new(ParamExtractor::new("name")),
            vec![Arc::new(Required), Arc::new(Length::min(3))],
        );
        assert!(extractor.extract(&ctx).unwrap().is_none());
        assert_eq!(ctx.validation().field_violations("name").len(), 1);
    }

    #[test]
    fn test_post_parse_validation_skipped_after_parse_failure() {
        let ctx = context(HttpRequest::get("/?age=old"));
        let extractor =
            ValidatingWrapperExtractor::new(parse_int("age"), vec![Arc::new(Range::min(18.0))]);
        let value = extractor.extract(&ctx).unwrap().unwrap();
        assert_eq!(*value.downcast::<i32>().unwrap(), 0);

        let errors = ctx.validation().field_violations("age");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].constraint, "parse");
    }

    #[test]
    fn test_post_parse_validation_runs_on_parsed_value() {
        let ctx = context(HttpRequest::get("/?age=12"));
        let extractor =
            ValidatingWrapperExtractor::new(parse_int("age"), vec![Arc::new(Range::min(18.0))]);
        let value = extractor.extract(&ctx).unwrap().unwrap();
        assert_eq!(*value.downcast::<i32>().unwrap(), 12);
        assert_eq!(ctx.validation().field_violations("age")[0].constraint, "range");
    }
}
