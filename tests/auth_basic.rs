//! Basic-auth gate matrix: credentials × authorizer policy, and the
//! challenge header on every refusal.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use http::{Method, StatusCode, header};
use tatami::middleware::AuthBasic;
use tatami::{Api, BoxedHandler, Context, Request, ResponseWriter, handler_fn, keys};

fn request(method: Method, authorization: Option<&str>) -> Request {
    let mut builder = http::Request::builder().method(method).uri("/");
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Bytes::new()).unwrap().into()
}

fn basic(user: &str, password: &str) -> String {
    format!("Basic {}", BASE64.encode(format!("{user}:{password}")))
}

async fn run(handler: &BoxedHandler, mut req: Request) -> ResponseWriter {
    let mut ctx = Context::new();
    let mut w = ResponseWriter::new();
    handler.call(&mut ctx, &mut w, &mut req).await;
    w
}

fn auth() -> AuthBasic {
    AuthBasic::new("test zone", |user, password| user == "admin" && password == "admin")
        .with_authorizer(|_user, req| req.method() == Method::GET)
}

/// Terminal handler that must never run on a refused request.
async fn must_not_run(_ctx: &mut Context, _w: &mut ResponseWriter, _req: &mut Request) {
    panic!("downstream handler ran past a failed auth gate");
}

async fn whoami(ctx: &mut Context, w: &mut ResponseWriter, _req: &mut Request) {
    let user = ctx.get::<String>(keys::REMOTE_USER).cloned().unwrap_or_default();
    w.write_json(&serde_json::json!({ "user": user }));
}

fn assert_challenged(w: &ResponseWriter) {
    assert_eq!(w.status(), Some(StatusCode::UNAUTHORIZED));
    assert_eq!(
        w.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Basic realm=\"test zone\""
    );
    let content_type = w.headers().get(header::CONTENT_TYPE).unwrap().to_str().unwrap();
    assert!(content_type.starts_with("application/json"));
    assert_eq!(w.body(), br#"{"Error":"Not Authorized"}"#);
}

#[tokio::test]
async fn missing_credentials_are_challenged() {
    let app = Api::new().using(auth()).make_handler(handler_fn(must_not_run));

    let w = run(&app, request(Method::GET, None)).await;
    assert_challenged(&w);
}

#[tokio::test]
async fn wrong_credentials_are_challenged() {
    let app = Api::new().using(auth()).make_handler(handler_fn(must_not_run));

    let w = run(&app, request(Method::GET, Some(&basic("admin", "AdmIn")))).await;
    assert_challenged(&w);
}

#[tokio::test]
async fn non_basic_scheme_is_challenged() {
    let app = Api::new().using(auth()).make_handler(handler_fn(must_not_run));

    let w = run(&app, request(Method::GET, Some("Bearer abcdef"))).await;
    assert_challenged(&w);
}

#[tokio::test]
async fn undecodable_base64_is_challenged() {
    let app = Api::new().using(auth()).make_handler(handler_fn(must_not_run));

    let w = run(&app, request(Method::GET, Some("Basic !!!not-base64!!!"))).await;
    assert_challenged(&w);
}

#[tokio::test]
async fn right_credentials_but_denied_method_are_challenged() {
    let app = Api::new().using(auth()).make_handler(handler_fn(must_not_run));

    let w = run(&app, request(Method::POST, Some(&basic("admin", "admin")))).await;
    assert_challenged(&w);
}

#[tokio::test]
async fn right_credentials_and_allowed_method_pass_through() {
    let app = Api::new().using(auth()).make_handler(handler_fn(whoami));

    let w = run(&app, request(Method::GET, Some(&basic("admin", "admin")))).await;
    assert_eq!(w.status(), Some(StatusCode::OK));
    // downstream observed the authenticated identity in the context
    assert_eq!(w.body(), br#"{"user":"admin"}"#);
}
