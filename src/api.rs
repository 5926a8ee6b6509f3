//! Middleware stack assembly and the panic recovery boundary.
//!
//! An [`Api`] collects middleware in order and folds them around the
//! application handler. The first layer added is the outermost: it runs first
//! on the way in and last on the way out. Each layer captures the next stage
//! at build time, so dispatch is a plain chain of calls with no per-request
//! allocation beyond the context itself.
//!
//! [`make_handler`](Api::make_handler) installs one extra, non-optional layer
//! outside everything else: the recovery boundary. A panic anywhere in the
//! chain is caught there, logged, and converted into a
//! `500 {"Error":"Internal Server Error"}` response. The panic never reaches
//! the transport and never disturbs other in-flight requests.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use http::StatusCode;
use tracing::error;

use crate::context::Context;
use crate::handler::{BoxedHandler, Handler};
use crate::middleware::Middleware;
use crate::request::Request;
use crate::response::ResponseWriter;

/// Orders middleware around an application handler.
///
/// ```rust,no_run
/// use tatami::middleware::{AccessLog, Recorder, Timer};
/// use tatami::{Api, Context, Request, ResponseWriter, handler_fn};
///
/// # async fn app(_: &mut Context, _: &mut ResponseWriter, _: &mut Request) {}
/// let handler = Api::new()
///     .using(AccessLog::new())
///     .using(Timer)
///     .using(Recorder)
///     .make_handler(handler_fn(app));
/// ```
pub struct Api {
    middleware: Vec<Box<dyn Middleware>>,
}

impl Api {
    pub fn new() -> Self {
        Self { middleware: Vec::new() }
    }

    /// Appends a middleware layer. The first layer added is the outermost.
    pub fn using(mut self, middleware: impl Middleware) -> Self {
        self.middleware.push(Box::new(middleware));
        self
    }

    /// Wraps `app` in the collected layers, innermost last, and installs the
    /// recovery boundary around the whole stack.
    pub fn make_handler(self, app: impl Handler) -> BoxedHandler {
        let mut handler: BoxedHandler = Arc::new(app);
        for middleware in self.middleware.iter().rev() {
            handler = middleware.wrap(handler);
        }
        Arc::new(Recover { inner: handler })
    }
}

impl Default for Api {
    fn default() -> Self {
        Self::new()
    }
}

// ── Recovery boundary ─────────────────────────────────────────────────────────

struct Recover {
    inner: BoxedHandler,
}

#[async_trait]
impl Handler for Recover {
    async fn call(&self, ctx: &mut Context, w: &mut ResponseWriter, req: &mut Request) {
        let outcome = AssertUnwindSafe(self.inner.call(ctx, w, req))
            .catch_unwind()
            .await;
        if let Err(payload) = outcome {
            error!(
                method = %req.method(),
                path = req.path(),
                "handler panicked: {}",
                panic_message(payload.as_ref()),
            );
            w.reset();
            w.write_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "opaque panic payload"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use bytes::Bytes;

    use super::*;
    use crate::handler::handler_fn;

    fn request() -> Request {
        http::Request::builder()
            .method(http::Method::GET)
            .uri("/")
            .body(Bytes::new())
            .unwrap()
            .into()
    }

    async fn run(handler: &BoxedHandler, req: &mut Request) -> ResponseWriter {
        let mut ctx = Context::new();
        let mut w = ResponseWriter::new();
        handler.call(&mut ctx, &mut w, req).await;
        w
    }

    struct Tag {
        name: &'static str,
        trace: Arc<Mutex<Vec<String>>>,
    }

    impl Middleware for Tag {
        fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
            Arc::new(TagHandler {
                name: self.name,
                trace: Arc::clone(&self.trace),
                next,
            })
        }
    }

    struct TagHandler {
        name: &'static str,
        trace: Arc<Mutex<Vec<String>>>,
        next: BoxedHandler,
    }

    #[async_trait]
    impl Handler for TagHandler {
        async fn call(&self, ctx: &mut Context, w: &mut ResponseWriter, req: &mut Request) {
            self.trace.lock().unwrap().push(format!("{} in", self.name));
            self.next.call(ctx, w, req).await;
            self.trace.lock().unwrap().push(format!("{} out", self.name));
        }
    }

    #[tokio::test]
    async fn first_layer_is_outermost() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let app_trace = Arc::clone(&trace);

        struct App {
            trace: Arc<Mutex<Vec<String>>>,
        }

        #[async_trait]
        impl Handler for App {
            async fn call(&self, _: &mut Context, _: &mut ResponseWriter, _: &mut Request) {
                self.trace.lock().unwrap().push("app".to_owned());
            }
        }

        let handler = Api::new()
            .using(Tag { name: "outer", trace: Arc::clone(&trace) })
            .using(Tag { name: "inner", trace: Arc::clone(&trace) })
            .make_handler(App { trace: app_trace });

        run(&handler, &mut request()).await;

        assert_eq!(
            *trace.lock().unwrap(),
            ["outer in", "inner in", "app", "inner out", "outer out"]
        );
    }

    async fn blows_up(_: &mut Context, _: &mut ResponseWriter, _: &mut Request) {
        panic!("boom");
    }

    #[tokio::test]
    async fn panic_becomes_a_500_response() {
        let handler = Api::new().make_handler(handler_fn(blows_up));

        let w = run(&handler, &mut request()).await;
        assert_eq!(w.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(w.body(), br#"{"Error":"Internal Server Error"}"#);
    }

    #[tokio::test]
    async fn panic_discards_a_half_written_response() {
        async fn half_writes(_: &mut Context, w: &mut ResponseWriter, _: &mut Request) {
            w.write_header(StatusCode::CREATED);
            w.write_json(&serde_json::json!({ "partial": true }));
            panic!("after writing");
        }

        let handler = Api::new().make_handler(handler_fn(half_writes));

        let w = run(&handler, &mut request()).await;
        assert_eq!(w.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(w.body(), br#"{"Error":"Internal Server Error"}"#);
    }
}
