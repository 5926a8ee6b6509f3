//! Handler trait and type erasure.
//!
//! # How async handlers are stored
//!
//! The router and the middleware stack need to hold handlers of *different*
//! concrete types behind one interface, so everything is stored as a
//! [`BoxedHandler`] trait object. The chain from user code to vtable call is:
//!
//! ```text
//! async fn hello(ctx, w, req) { … }          ← user writes this
//!        ↓ handler_fn(hello)
//! FnHandler(hello)                           ← adapter, implements Handler
//!        ↓ Arc::new(…)
//! BoxedHandler = Arc<dyn Handler>            ← stored in the route tree
//!        ↓ handler.call(ctx, w, req) at request time
//! one Arc clone + one virtual dispatch
//! ```
//!
//! A handler receives three `&mut` borrows for the lifetime of one request:
//! the [`Context`] it shares with the other layers, the [`ResponseWriter`] it
//! answers through, and the [`Request`] whose body it may consume. The borrows
//! are threaded explicitly down the chain — never stashed in globals — so one
//! request's state is unreachable from any other.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::Context;
use crate::request::Request;
use crate::response::ResponseWriter;

/// A request-processing stage.
///
/// Everything that can answer a request implements this trait: the
/// [`Router`](crate::Router), every wrapped middleware layer, and the
/// application handler at the centre of the stack. Plain `async fn`s become
/// handlers through [`handler_fn`].
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    async fn call(&self, ctx: &mut Context, w: &mut ResponseWriter, req: &mut Request);
}

/// A heap-allocated, type-erased handler shared across concurrent requests.
///
/// `Arc` gives cheap, thread-safe shared ownership — one atomic reference
/// count increment per dispatch, no copying of the handler itself.
pub type BoxedHandler = Arc<dyn Handler>;

// ── Function adapter ──────────────────────────────────────────────────────────

/// Helper trait expressing `for<'a> Fn(&'a mut …) -> impl Future + 'a`.
///
/// Rust cannot name "an async function over borrowed arguments" with a single
/// generic parameter — the future's type depends on the borrow's lifetime. The
/// usual workaround is a one-lifetime helper trait whose associated `Future`
/// is chosen per lifetime. `async fn` items satisfy the blanket impl below;
/// closures generally need explicit boxing and are not supported.
pub trait HandlerFunc<'a>: Send + Sync + 'static {
    type Future: Future<Output = ()> + Send + 'a;

    fn invoke(
        &self,
        ctx: &'a mut Context,
        w: &'a mut ResponseWriter,
        req: &'a mut Request,
    ) -> Self::Future;
}

impl<'a, F, Fut> HandlerFunc<'a> for F
where
    F: Fn(&'a mut Context, &'a mut ResponseWriter, &'a mut Request) -> Fut
        + Send
        + Sync
        + 'static,
    Fut: Future<Output = ()> + Send + 'a,
{
    type Future = Fut;

    fn invoke(
        &self,
        ctx: &'a mut Context,
        w: &'a mut ResponseWriter,
        req: &'a mut Request,
    ) -> Fut {
        self(ctx, w, req)
    }
}

/// Adapts a plain `async fn(&mut Context, &mut ResponseWriter, &mut Request)`
/// into a [`Handler`].
///
/// ```rust,no_run
/// use tatami::{Context, Request, ResponseWriter, Router, handler_fn};
///
/// async fn hello(_ctx: &mut Context, w: &mut ResponseWriter, _req: &mut Request) {
///     w.write_json(&serde_json::json!({ "hello": "world" }));
/// }
///
/// # fn main() -> Result<(), tatami::Error> {
/// let router = Router::new().get("/hello", handler_fn(hello))?;
/// # Ok(())
/// # }
/// ```
pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: for<'a> HandlerFunc<'a>,
{
    FnHandler(f)
}

/// Newtype returned by [`handler_fn`], bridging the typed function to the
/// trait-object world.
pub struct FnHandler<F>(F);

#[async_trait]
impl<F> Handler for FnHandler<F>
where
    F: for<'a> HandlerFunc<'a>,
{
    async fn call(&self, ctx: &mut Context, w: &mut ResponseWriter, req: &mut Request) {
        self.0.invoke(ctx, w, req).await;
    }
}
