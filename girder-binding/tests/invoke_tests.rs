//! Request-time binding through compiled invokers.

use girder_binding::prelude::*;
use girder_core::{FileItem, HttpRequest, HttpResponse, InputStream};
use girder_session::{SessionConfig, SessionManager};
use girder_validation::{Length, Range};
use serde::Deserialize;
use std::io::Read;
use std::path::PathBuf;

const SECRET: &str = "binding-tests-secret-long-enough-for-hmac";

fn manager() -> SessionManager {
    SessionManager::new(SessionConfig::new(SECRET).unwrap()).unwrap()
}

fn open(request: HttpRequest) -> Context {
    Context::open(request, &manager())
}

#[derive(Default)]
struct Catalog {
    currency: &'static str,
}

#[derive(Debug, Deserialize, PartialEq)]
struct NewItem {
    name: String,
    price: u32,
}

impl Catalog {
    fn item(&self, id: i32, validation: Validation) -> String {
        if validation.has_field_violation("id") {
            format!("invalid id, got {}", id)
        } else {
            format!("item {}", id)
        }
    }

    fn list(&self, page: Option<u32>, sort: Option<String>, ids: Vec<i64>) -> String {
        format!("{:?} {:?} {:?}", page, sort, ids)
    }

    fn create(&self, item: NewItem, flash: FlashScope) -> String {
        flash.success(format!("created {}", item.name)).unwrap();
        format!("{} {}", item.price, self.currency)
    }

    fn preview(&self, item: Option<NewItem>) -> bool {
        item.is_some()
    }

    fn cart(&self, owner: Option<String>, session: Session) -> usize {
        session.put("visited", "cart").unwrap();
        owner.map(|o| o.len()).unwrap_or(0)
    }

    fn upload(&self, avatar: FileItem, extra: Option<FileItem>, all: Vec<FileItem>) -> String {
        format!("{} {} {}", avatar.file_name, extra.is_some(), all.len())
    }
}

#[test]
fn test_malformed_integer_binds_default_and_records_violation() {
    let invoker = RouteCompiler::new()
        .compile(HandlerMethod::new("Catalog::item", Catalog::item).annotate(0, Param::named("id")))
        .unwrap();

    let context = open(HttpRequest::get("/item?id=notanumber"));
    let result = invoker.invoke(&Catalog::default(), &context).unwrap();
    assert_eq!(result, "invalid id, got 0");

    let errors = context.validation().field_violations("id");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].constraint, "parse");
    assert_eq!(errors[0].value.as_deref(), Some("notanumber"));

    let context = open(HttpRequest::get("/item?id=42"));
    assert_eq!(invoker.invoke(&Catalog::default(), &context).unwrap(), "item 42");
}

#[test]
fn test_missing_primitive_binds_default_without_violation() {
    let invoker = RouteCompiler::new()
        .compile(HandlerMethod::new("Catalog::item", Catalog::item).annotate(0, Param::named("id")))
        .unwrap();

    let context = open(HttpRequest::get("/item"));
    assert_eq!(invoker.invoke(&Catalog::default(), &context).unwrap(), "item 0");
    assert!(!context.validation().has_violations());
}

#[test]
fn test_optional_and_multi_valued_parameters() {
    let invoker = RouteCompiler::new()
        .compile(
            HandlerMethod::new("Catalog::list", Catalog::list)
                .annotate(0, Param::named("page"))
                .annotate(1, Param::named("sort"))
                .annotate(2, Params::named("id")),
        )
        .unwrap();

    let context = open(HttpRequest::get("/list"));
    assert_eq!(invoker.invoke(&Catalog::default(), &context).unwrap(), "None None []");

    let context = open(HttpRequest::get("/list?page=2&sort=name&id=3&id=x&id=5"));
    assert_eq!(
        invoker.invoke(&Catalog::default(), &context).unwrap(),
        "Some(2) Some(\"name\") [3, 0, 5]"
    );
    assert_eq!(context.validation().field_violations("id").len(), 1);

    let context = open(HttpRequest::get("/list?page=-1"));
    assert_eq!(invoker.invoke(&Catalog::default(), &context).unwrap(), "None None []");
    assert!(context.validation().has_field_violation("page"));
}

#[test]
fn test_json_body_binds_and_flash_is_written() {
    let mut compiler = RouteCompiler::new();
    compiler.register_body::<NewItem>();
    let invoker = compiler
        .compile(HandlerMethod::new("Catalog::create", Catalog::create))
        .unwrap();

    let request = HttpRequest::post("/items")
        .with_json(&serde_json::json!({ "name": "lamp", "price": 30 }))
        .unwrap();
    let context = open(request);
    let catalog = Catalog { currency: "EUR" };
    assert_eq!(invoker.invoke(&catalog, &context).unwrap(), "30 EUR");

    let mut response = HttpResponse::ok();
    context.finalize(&mut response).unwrap();
    assert!(response.cookie("GIRDER_FLASH").is_some());
}

#[test]
fn test_malformed_body_is_a_binding_error() {
    let mut compiler = RouteCompiler::new();
    compiler.register_body::<NewItem>();
    let invoker = compiler
        .compile(HandlerMethod::new("Catalog::create", Catalog::create))
        .unwrap();

    let request = HttpRequest::post("/items")
        .with_header("content-type", "application/json")
        .with_body(&b"{ not json"[..]);
    let err = invoker.invoke(&Catalog::default(), &open(request)).unwrap_err();
    assert!(err.is_binding());
    assert_eq!(err.status_code(), 400);

    let err = invoker
        .invoke(&Catalog::default(), &open(HttpRequest::post("/items")))
        .unwrap_err();
    assert!(err.is_binding());
}

#[test]
fn test_optional_body_is_none_when_empty() {
    let mut compiler = RouteCompiler::new();
    compiler.register_body::<NewItem>();
    let invoker = compiler
        .compile(HandlerMethod::new("Catalog::preview", Catalog::preview))
        .unwrap();

    assert!(!invoker.invoke(&Catalog::default(), &open(HttpRequest::post("/p"))).unwrap());

    let request = HttpRequest::post("/p")
        .with_form_body("name=desk&price=120")
        .unwrap();
    assert!(invoker.invoke(&Catalog::default(), &open(request)).unwrap());
}

#[test]
fn test_session_values_and_handles_bind() {
    let invoker = RouteCompiler::new()
        .compile(
            HandlerMethod::new("Catalog::cart", Catalog::cart)
                .annotate(0, SessionParam::named("owner")),
        )
        .unwrap();

    let context = open(HttpRequest::get("/cart"));
    context.session().put("owner", "grace").unwrap();
    assert_eq!(invoker.invoke(&Catalog::default(), &context).unwrap(), 5);
    assert_eq!(context.session().get("visited").as_deref(), Some("cart"));

    let context = open(HttpRequest::get("/cart"));
    assert_eq!(invoker.invoke(&Catalog::default(), &context).unwrap(), 0);
}

#[test]
fn test_uploads_bind_by_field() {
    let invoker = RouteCompiler::new()
        .compile(
            HandlerMethod::new("Catalog::upload", Catalog::upload)
                .annotate(0, Param::named("avatar"))
                .annotate(1, Param::named("extra"))
                .annotate(2, Params::named("avatar")),
        )
        .unwrap();

    let request = HttpRequest::post("/upload")
        .with_file(FileItem::new("avatar", "a.png", "image/png", &b"one"[..]))
        .with_file(FileItem::new("avatar", "b.png", "image/png", &b"two"[..]));
    let result = invoker.invoke(&Catalog::default(), &open(request)).unwrap();
    assert_eq!(result, "a.png false 2");

    // A required upload that is absent cannot be bound.
    let err = invoker
        .invoke(&Catalog::default(), &open(HttpRequest::post("/upload")))
        .unwrap_err();
    match err {
        InvocationError::Binding { index, .. } => assert_eq!(index, 0),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_uploads_bind_as_paths_and_streams() {
    struct Files;
    fn store(_: &Files, path: PathBuf, stream: InputStream) -> (PathBuf, String, String) {
        let mut text = String::new();
        let mut stream = stream;
        stream.read_to_string(&mut text).unwrap();
        let on_disk = std::fs::read_to_string(&path).unwrap();
        (path, on_disk, text)
    }

    let invoker = RouteCompiler::new()
        .compile(
            HandlerMethod::new("store", store)
                .annotate(0, Param::named("doc"))
                .annotate(1, Param::named("doc")),
        )
        .unwrap();

    let request = HttpRequest::post("/files")
        .with_file(FileItem::new("doc", "notes.txt", "text/plain", &b"hello"[..]));
    let context = open(request);
    let (path, on_disk, streamed) = invoker.invoke(&Files, &context).unwrap();
    assert_eq!(on_disk, "hello");
    assert_eq!(streamed, "hello");

    // The spilled upload is removed with the request.
    assert!(path.exists());
    drop(context);
    assert!(!path.exists());
}

#[test]
fn test_validators_run_before_and_after_parsing() {
    struct Profiles;
    fn update(_: &Profiles, name: String, age: u8, validation: Validation) -> (String, u8, usize) {
        (name, age, validation.violations().len())
    }

    let invoker = RouteCompiler::new()
        .compile(
            HandlerMethod::new("update", update)
                .annotate(0, Param::named("name"))
                .annotate(0, Validate::with(Length::between(2, 10)))
                .annotate(1, Param::named("age"))
                .annotate(1, Validate::with(Range::between(18.0, 120.0))),
        )
        .unwrap();

    let ok = open(HttpRequest::get("/?name=ada&age=36"));
    assert_eq!(invoker.invoke(&Profiles, &ok).unwrap(), ("ada".to_string(), 36, 0));

    let young = open(HttpRequest::get("/?name=x&age=12"));
    let (name, age, count) = invoker.invoke(&Profiles, &young).unwrap();
    assert_eq!((name.as_str(), age), ("x", 12));
    assert_eq!(count, 2);
    assert_eq!(young.validation().field_violations("age")[0].constraint, "range");

    // A parse failure suppresses the range check on the same field.
    let garbage = open(HttpRequest::get("/?name=ada&age=old"));
    invoker.invoke(&Profiles, &garbage).unwrap();
    let errors = garbage.validation().field_violations("age");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].constraint, "parse");
}

#[test]
fn test_attributes_bind_by_type() {
    #[derive(Debug, Clone, PartialEq)]
    struct CurrentUser(u64);
    struct Admin;
    fn whoami(_: &Admin, user: Option<CurrentUser>) -> Option<u64> {
        user.map(|u| u.0)
    }

    let invoker = RouteCompiler::new()
        .compile(
            HandlerMethod::new("whoami", whoami)
                .annotate(0, Attribute::<CurrentUser>::named("user").optional()),
        )
        .unwrap();

    let context = open(HttpRequest::get("/me"));
    assert_eq!(invoker.invoke(&Admin, &context).unwrap(), None);

    context.set_attribute("user", CurrentUser(9));
    assert_eq!(invoker.invoke(&Admin, &context).unwrap(), Some(9));

    context.set_attribute("user", "not a user".to_string());
    let err = invoker.invoke(&Admin, &context).unwrap_err();
    assert!(err.is_binding());
}
