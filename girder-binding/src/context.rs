//! Per-request context handed to extractors and handlers.

use girder_core::{FileItem, HttpRequest, HttpResponse, TempPath};
use girder_session::{FlashScope, Session, SessionManager, SessionResult};
use girder_validation::Validation;
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

struct ContextInner {
    request: HttpRequest,
    session: Session,
    flash: FlashScope,
    validation: Validation,
    attributes: RwLock<HashMap<String, Arc<dyn Any + Send + Sync>>>,
    temp_files: Mutex<Vec<TempPath>>,
}

/// Everything a handler may bind from one request.
///
/// Cloning is cheap and clones share the same session, flash scope,
/// validation sink and attributes.
///
/// ```
/// use girder_binding::Context;
/// use girder_core::{HttpRequest, HttpResponse};
/// use girder_session::{SessionConfig, SessionManager};
///
/// let manager = SessionManager::new(
///     SessionConfig::new("an application secret of 32+ bytes!").unwrap(),
/// )
/// .unwrap();
///
/// let request = HttpRequest::get("/users/7?tab=posts").with_path_param("id", "7");
/// let context = Context::open(request, &manager);
/// assert_eq!(context.path_parameter("id"), Some("7"));
/// assert_eq!(context.parameter("tab"), Some("posts"));
///
/// context.session().put("last_seen", "7").unwrap();
/// let mut response = HttpResponse::ok();
/// context.finalize(&mut response).unwrap();
/// assert!(response.cookie("GIRDER_SESSION").is_some());
/// ```
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl Context {
    /// Build a context around already initialized session and flash handles.
    pub fn new(request: HttpRequest, session: Session, flash: FlashScope) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                request,
                session,
                flash,
                validation: Validation::new(),
                attributes: RwLock::new(HashMap::new()),
                temp_files: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Build a context, loading session and flash state from the request.
    pub fn open(request: HttpRequest, manager: &SessionManager) -> Self {
        let session = manager.load_session(&request);
        let flash = manager.load_flash(&request);
        Self::new(request, session, flash)
    }

    /// Write session and flash cookies onto `response`.
    pub fn finalize(&self, response: &mut HttpResponse) -> SessionResult<()> {
        self.inner.session.save(&self.inner.request, response)?;
        self.inner.flash.save(&self.inner.request, response);
        Ok(())
    }

    pub fn request(&self) -> &HttpRequest {
        &self.inner.request
    }

    pub fn path_parameter(&self, key: &str) -> Option<&str> {
        self.inner.request.path_param(key)
    }

    /// First value of a query or form parameter.
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.inner.request.param(key)
    }

    pub fn parameter_values(&self, key: &str) -> &[String] {
        self.inner.request.param_values(key)
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.inner.request.header(key)
    }

    pub fn headers(&self, key: &str) -> &[String] {
        self.inner.request.header_values(key)
    }

    pub fn parameter_as_file_item(&self, key: &str) -> Option<&FileItem> {
        self.inner.request.file(key)
    }

    pub fn parameter_as_file_items(&self, key: &str) -> Vec<&FileItem> {
        self.inner.request.files_for(key)
    }

    /// Deserialize the body according to its content type.
    pub fn parse_body<T: DeserializeOwned>(&self) -> Result<T, girder_core::Error> {
        self.inner.request.parse_body()
    }

    /// Whether the request carries a body at all.
    pub fn has_body(&self) -> bool {
        !self.inner.request.body.is_empty()
    }

    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    pub fn flash(&self) -> &FlashScope {
        &self.inner.flash
    }

    pub fn validation(&self) -> &Validation {
        &self.inner.validation
    }

    /// A request attribute, if one of type `T` is stored under `key`.
    pub fn attribute<T: Clone + Send + Sync + 'static>(&self, key: &str) -> Option<T> {
        self.inner
            .attributes
            .read()
            .get(key)
            .and_then(|value| value.downcast_ref::<T>())
            .cloned()
    }

    /// Whether anything is stored under `key`, regardless of type.
    pub fn has_attribute(&self, key: &str) -> bool {
        self.inner.attributes.read().contains_key(key)
    }

    pub fn set_attribute<T: Send + Sync + 'static>(&self, key: impl Into<String>, value: T) {
        self.inner
            .attributes
            .write()
            .insert(key.into(), Arc::new(value));
    }

    pub fn remove_attribute(&self, key: &str) -> bool {
        self.inner.attributes.write().remove(key).is_some()
    }

    /// Keep a temporary file until the last clone of this context is
    /// dropped, then delete it.
    pub fn hold_temp_file(&self, file: TempPath) {
        self.inner.temp_files.lock().push(file);
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("method", &self.inner.request.method)
            .field("path", &self.inner.request.path)
            .field("session", &self.inner.session)
            .field("flash", &self.inner.flash)
            .finish_non_exhaustive()
    }
}
