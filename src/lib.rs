// Girder - controller argument binding and cookie sessions for Rust
//
// Handlers are plain methods whose parameters are bound from the request by
// a route compiled once at startup. Session and flash state travel in signed
// cookies, so the server keeps nothing between requests.

// Re-export core functionality
pub use girder_core::*;

pub use girder_binding::{
    Annotation, ArgumentExtractor, BindingResult, ConfigurationError, ConfigurationErrorKind,
    Context, ControllerMethodInvoker, ExtractError, ExtractorFactory, Handler, HandlerMethod,
    InvocationError, ParamParser, ParseParam, RouteCompiler, annotation, extractors, parsers,
};
pub use girder_session::{
    CookieCrypto, FlashScope, Session, SessionConfig, SessionError, SessionManager,
    SessionResult, codec,
};
pub use girder_validation::{Validation, ValidationError, ValidationErrors, Validator};

// Member crates, for anything not re-exported above
pub use girder_binding;
pub use girder_log;
pub use girder_session;
pub use girder_validation;

/// Serve one request through a compiled handler.
///
/// Opens the session and flash scope from `request`, invokes the handler,
/// turns the result into a response with `respond`, and writes the cookies
/// back. A binding failure answers 400 and a fault 500; in both cases the
/// session is still saved.
///
/// ```
/// use girder::prelude::*;
///
/// struct Hello;
///
/// impl Hello {
///     fn greet(&self, name: Option<String>, session: Session) -> String {
///         let name = name.or_else(|| session.get("name")).unwrap_or_default();
///         session.put("name", &name).unwrap();
///         format!("hello {}", name)
///     }
/// }
///
/// let manager = SessionManager::new(SessionConfig::new(SessionConfig::generate_secret()).unwrap()).unwrap();
/// let invoker = RouteCompiler::new()
///     .compile(HandlerMethod::new("Hello::greet", Hello::greet).annotate(0, Param::named("name")))
///     .unwrap();
///
/// let response = girder::dispatch(&invoker, &Hello, &manager, HttpRequest::get("/?name=ada"), |body| {
///     HttpResponse::ok().with_body(body.into_bytes())
/// })
/// .unwrap();
/// assert_eq!(response.body, b"hello ada");
/// assert!(response.cookie("GIRDER_SESSION").is_some());
/// ```
pub fn dispatch<T, R, F>(
    invoker: &ControllerMethodInvoker<T, R>,
    target: &T,
    manager: &SessionManager,
    request: HttpRequest,
    respond: F,
) -> SessionResult<HttpResponse>
where
    F: FnOnce(R) -> HttpResponse,
{
    let context = Context::open(request, manager);
    let mut response = match invoker.invoke(target, &context) {
        Ok(result) => respond(result),
        Err(e) => HttpResponse::new(e.status_code()).with_body(e.to_string().into_bytes()),
    };
    context.finalize(&mut response)?;
    Ok(response)
}

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        Context, ControllerMethodInvoker, Error, FileItem, FlashScope, HandlerMethod,
        HttpRequest, HttpResponse, InvocationError, RouteCompiler, Session, SessionConfig,
        SessionManager, Validation,
    };
    pub use girder_binding::annotation::{
        Attribute, Header, Headers, Param, Params, PathParam, SessionParam, Validate,
    };
}
