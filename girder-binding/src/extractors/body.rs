// Whole-body extractor

use super::{ArgumentExtractor, Value};
use crate::context::Context;
use crate::error::ExtractError;
use girder_core::TypeInfo;
use serde::de::DeserializeOwned;
use std::fmt;
use std::marker::PhantomData;

/// Deserializes the request body into `T`, as JSON or a url-encoded form
/// depending on the content type. An empty body yields no value.
pub struct BodyAsExtractor<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned + Send + 'static> BodyAsExtractor<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T: DeserializeOwned + Send + 'static> Default for BodyAsExtractor<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for BodyAsExtractor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BodyAsExtractor<{}>", std::any::type_name::<T>())
    }
}

impl<T: DeserializeOwned + Send + 'static> ArgumentExtractor for BodyAsExtractor<T> {
    fn extract(&self, context: &Context) -> Result<Option<Value>, ExtractError> {
        if !context.has_body() {
            return Ok(None);
        }
        let value: T = context.parse_body()?;
        Ok(Some(Box::new(value)))
    }

    fn extracted_type(&self) -> TypeInfo {
        TypeInfo::of::<T>()
    }

    fn field_name(&self) -> Option<&str> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use girder_core::HttpRequest;
    use girder_session::{SessionConfig, SessionManager};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Signup {
        email: String,
        age: u32,
    }

    fn context(request: HttpRequest) -> Context {
        let manager = SessionManager::new(
            SessionConfig::new("0123456789abcdef0123456789abcdef").unwrap(),
        )
        .unwrap();
        Context::open(request, &manager)
    }

    #[test]
    fn test_json_body() {
        let request = HttpRequest::post("/signup")
            .with_json(&serde_json::json!({ "email": "a@b.c", "age": 30 }))
            .unwrap();
        let value = BodyAsExtractor::<Signup>::new()
            .extract(&context(request))
            .unwrap()
            .unwrap();
        assert_eq!(
            *value.downcast::<Signup>().unwrap(),
            Signup { email: "a@b.c".into(), age: 30 }
        );
    }

    #[test]
    fn test_form_body() {
        let request = HttpRequest::post("/signup")
            .with_form_body("email=x%40y.z&age=5")
            .unwrap();
        let value = BodyAsExtractor::<Signup>::new()
            .extract(&context(request))
            .unwrap()
            .unwrap();
        assert_eq!(value.downcast::<Signup>().unwrap().email, "x@y.z");
    }

    #[test]
    fn test_empty_and_invalid_bodies() {
        let extractor = BodyAsExtractor::<Signup>::new();
        assert!(extractor.extract(&context(HttpRequest::post("/"))).unwrap().is_none());

        let bad = HttpRequest::post("/")
            .with_header("content-type", "application/json")
            .with_body("{not json");
        assert!(matches!(extractor.extract(&context(bad)), Err(ExtractError::Body(_))));

        let xml = HttpRequest::post("/")
            .with_header("content-type", "application/xml")
            .with_body("<a/>");
        assert!(extractor.extract(&context(xml)).is_err());
        assert_eq!(extractor.field_name(), None);
    }
}
