// HTTP request and response types

use crate::cookie::{Cookie, parse_cookie_header};
use crate::form::{FileItem, FormPart, MultipartParser, parse_form_pairs};
use crate::Error;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;

/// HTTP request as seen by the framework.
///
/// Header names are stored lowercased. Query and form parameters share one
/// multi-valued table, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, Vec<String>>,
    pub body: Bytes,
    pub path_params: HashMap<String, String>,
    pub params: HashMap<String, Vec<String>>,
    pub files: Vec<FileItem>,
}

impl HttpRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        let mut request = Self {
            method: method.into(),
            ..Self::default()
        };

        match path.split_once('?') {
            Some((path, query)) => {
                request.path = path.to_string();
                request.add_query_string(query);
            }
            None => request.path = path,
        }
        request
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new("GET", path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new("POST", path)
    }

    /// Append the pairs of a raw query string. Undecodable pairs are skipped.
    pub fn add_query_string(&mut self, query: &str) {
        if let Ok(pairs) = parse_form_pairs(query.as_bytes()) {
            for (name, value) in pairs {
                self.params.entry(name).or_default().push(value);
            }
        }
    }

    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.as_ref().to_ascii_lowercase())
            .or_default()
            .push(value.into());
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.entry(name.into()).or_default().push(value.into());
        self
    }

    pub fn with_path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(name.into(), value.into());
        self
    }

    /// Append a cookie to the `Cookie` header.
    pub fn with_cookie(mut self, name: &str, value: &str) -> Self {
        let pair = format!("{}={}", name, value);
        if let Some(existing) = self.headers.get_mut("cookie").and_then(|v| v.last_mut()) {
            existing.push_str("; ");
            existing.push_str(&pair);
            return self;
        }
        self.with_header("cookie", pair)
    }

    pub fn with_file(mut self, item: FileItem) -> Self {
        self.files.push(item);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_json<T: Serialize>(self, value: &T) -> Result<Self, Error> {
        let body =
            serde_json::to_vec(value).map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(self
            .with_header("content-type", "application/json")
            .with_body(body))
    }

    /// Set a url-encoded form body. Its fields become parameters.
    pub fn with_form_body(mut self, body: impl Into<Bytes>) -> Result<Self, Error> {
        let body = body.into();
        for (name, value) in parse_form_pairs(&body)? {
            self.params.entry(name).or_default().push(value);
        }
        Ok(self
            .with_header("content-type", "application/x-www-form-urlencoded")
            .with_body(body))
    }

    /// Set a multipart body. Text parts become parameters, file parts uploads.
    pub fn with_multipart_body(
        mut self,
        content_type: &str,
        body: impl Into<Bytes>,
    ) -> Result<Self, Error> {
        let body = body.into();
        for part in MultipartParser::from_content_type(content_type)?.parse(&body)? {
            match part {
                FormPart::Text { name, value } => {
                    self.params.entry(name).or_default().push(value)
                }
                FormPart::File(item) => self.files.push(item),
            }
        }
        Ok(self.with_header("content-type", content_type).with_body(body))
    }

    /// First value of a header, case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.header_values(name).first().map(String::as_str)
    }

    pub fn header_values(&self, name: &str) -> &[String] {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    /// First value of a query or form parameter
    pub fn param(&self, name: &str) -> Option<&str> {
        self.param_values(name).first().map(String::as_str)
    }

    pub fn param_values(&self, name: &str) -> &[String] {
        self.params.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Value of the first cookie called `name`
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.header_values("cookie")
            .iter()
            .flat_map(|h| parse_cookie_header(h))
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn file(&self, field: &str) -> Option<&FileItem> {
        self.files.iter().find(|f| f.field_name == field)
    }

    pub fn files_for(&self, field: &str) -> Vec<&FileItem> {
        self.files.iter().filter(|f| f.field_name == field).collect()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Parse the request body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_slice(&self.body).map_err(|e| Error::Deserialization(e.to_string()))
    }

    /// Parse the request body as a url-encoded form
    pub fn form<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_urlencoded::from_bytes(&self.body)
            .map_err(|e| Error::Deserialization(e.to_string()))
    }

    /// Parse the body according to its content type. JSON is assumed when
    /// the header is missing.
    pub fn parse_body<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let media_type = self
            .content_type()
            .map(|ct| ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase());

        match media_type.as_deref() {
            None | Some("application/json") => self.json(),
            Some(mt) if mt.ends_with("+json") => self.json(),
            Some("application/x-www-form-urlencoded") => self.form(),
            Some(other) => Err(Error::UnsupportedMediaType(other.to_string())),
        }
    }
}

/// HTTP response wrapper
#[derive(Debug, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    pub cookies: Vec<Cookie>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn ok() -> Self {
        Self::new(200)
    }

    pub fn bad_request() -> Self {
        Self::new(400)
    }

    pub fn internal_server_error() -> Self {
        Self::new(500)
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn with_json<T: Serialize>(mut self, value: &T) -> Result<Self, Error> {
        self.body = serde_json::to_vec(value).map_err(|e| Error::Serialization(e.to_string()))?;
        self.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        Ok(self)
    }

    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Add a cookie, replacing an earlier one with the same name.
    pub fn add_cookie(&mut self, cookie: Cookie) {
        self.cookies.retain(|c| c.name != cookie.name);
        self.cookies.push(cookie);
    }

    pub fn cookie(&self, name: &str) -> Option<&Cookie> {
        self.cookies.iter().find(|c| c.name == name)
    }

    /// One `Set-Cookie` header value per cookie.
    pub fn set_cookie_headers(&self) -> Vec<String> {
        self.cookies.iter().map(Cookie::to_header_value).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Login {
        user: String,
        remember: bool,
    }

    #[test]
    fn test_query_string_in_path() {
        let request = HttpRequest::get("/search?q=rust+lang&tag=a&tag=b");
        assert_eq!(request.path, "/search");
        assert_eq!(request.param("q"), Some("rust lang"));
        assert_eq!(request.param_values("tag"), &["a".to_string(), "b".to_string()]);
        assert!(request.param_values("missing").is_empty());
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let request = HttpRequest::get("/")
            .with_header("X-Trace", "1")
            .with_header("x-trace", "2");
        assert_eq!(request.header("X-TRACE"), Some("1"));
        assert_eq!(request.header_values("x-trace").len(), 2);
    }

    #[test]
    fn test_cookies() {
        let request = HttpRequest::get("/")
            .with_cookie("a", "1")
            .with_cookie("GIRDER_SESSION", "sig-payload");
        assert_eq!(request.cookie("a").as_deref(), Some("1"));
        assert_eq!(request.cookie("GIRDER_SESSION").as_deref(), Some("sig-payload"));
        assert_eq!(request.cookie("b"), None);
    }

    #[test]
    fn test_parse_body_by_content_type() {
        let json = HttpRequest::post("/login")
            .with_json(&serde_json::json!({"user": "ada", "remember": true}))
            .unwrap();
        assert_eq!(
            json.parse_body::<Login>().unwrap(),
            Login { user: "ada".into(), remember: true }
        );

        let form = HttpRequest::post("/login")
            .with_form_body("user=ada&remember=false")
            .unwrap();
        assert_eq!(form.param("user"), Some("ada"));
        assert!(!form.parse_body::<Login>().unwrap().remember);

        let xml = HttpRequest::post("/login")
            .with_header("Content-Type", "text/xml")
            .with_body("<login/>");
        assert!(matches!(
            xml.parse_body::<Login>(),
            Err(Error::UnsupportedMediaType(_))
        ));
    }

    #[test]
    fn test_response_cookie_replacement() {
        let mut response = HttpResponse::ok();
        response.add_cookie(Cookie::new("a", "1"));
        response.add_cookie(Cookie::new("a", "2"));
        assert_eq!(response.cookies.len(), 1);
        assert_eq!(response.cookie("a").map(|c| c.value.as_str()), Some("2"));
        assert_eq!(response.set_cookie_headers(), vec!["a=2".to_string()]);
    }
}
