//! # tatami
//!
//! A small JSON REST middleware framework: an ordered stack of
//! request-processing layers composed around your handler. Nothing more.
//! Nothing less.
//!
//! ## The shape
//!
//! A request flows through the layers outermost-first, reaches the router,
//! which picks the application handler, and unwinds back out so each layer
//! can finish its cross-cutting concern:
//!
//! ```text
//! request ──▶ recovery ─▶ access log ─▶ timer ─▶ recorder ─▶ auth ─▶ router ─▶ your handler
//! response ◀─ recovery ◀─ access log ◀─ timer ◀─ recorder ◀─ auth ◀─ router ◀──────┘
//! ```
//!
//! Layers talk to each other through one request-scoped [`Context`] threaded
//! down the chain — the auth layer writes the user, the timer writes the
//! elapsed time, the access log reads both. No globals, so nothing can leak
//! between concurrent requests.
//!
//! The recovery boundary is always installed: a panicking handler produces
//! `500 {"Error":"Internal Server Error"}` and the process keeps serving.
//!
//! What the reverse proxy in front of you already owns — TLS termination,
//! rate limiting, slow-client protection, body-size limits — tatami
//! intentionally ignores.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use tatami::middleware::{AccessLog, Recorder, Timer};
//! use tatami::{Api, Context, Request, ResponseWriter, Router, Server, handler_fn};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), tatami::Error> {
//!     let router = Router::new()
//!         .get("/users/:id", handler_fn(get_user))?
//!         .post("/users", handler_fn(create_user))?;
//!
//!     let api = Api::new()
//!         .using(AccessLog::new())
//!         .using(Timer)
//!         .using(Recorder);
//!
//!     Server::bind("0.0.0.0:3000").serve(api.make_handler(router)).await
//! }
//!
//! async fn get_user(ctx: &mut Context, w: &mut ResponseWriter, _req: &mut Request) {
//!     let id = ctx.path_param("id").unwrap_or("unknown").to_owned();
//!     w.write_json(&serde_json::json!({ "id": id, "name": "alice" }));
//! }
//!
//! async fn create_user(_ctx: &mut Context, w: &mut ResponseWriter, req: &mut Request) {
//!     let input: serde_json::Value = match req.decode_json_payload() {
//!         Ok(input) => input,
//!         Err(e) => return w.write_error(e.status(), &e.to_string()),
//!     };
//!     w.write_json(&input);
//! }
//! ```

mod api;
mod context;
mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod health;
pub mod middleware;

pub use api::Api;
pub use context::{Context, PathParams, keys};
pub use error::Error;
pub use handler::{BoxedHandler, FnHandler, Handler, HandlerFunc, handler_fn};
pub use request::{PayloadError, Request};
pub use response::ResponseWriter;
pub use router::{RouteError, Router};
pub use server::Server;

// The method and status vocabulary is the `http` crate's; re-exported so
// applications don't need a direct dependency for the common cases.
pub use http::{Method, StatusCode};
