//! Request timing.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Local;

use crate::context::{Context, keys};
use crate::handler::{BoxedHandler, Handler};
use crate::middleware::Middleware;
use crate::request::Request;
use crate::response::ResponseWriter;

/// Records the wall-clock start time under [`keys::START_TIME`] before
/// delegating and the downstream duration under [`keys::ELAPSED_TIME`] after.
#[derive(Clone, Copy, Debug, Default)]
pub struct Timer;

impl Middleware for Timer {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(TimerHandler { next })
    }
}

struct TimerHandler {
    next: BoxedHandler,
}

#[async_trait]
impl Handler for TimerHandler {
    async fn call(&self, ctx: &mut Context, w: &mut ResponseWriter, req: &mut Request) {
        ctx.set(keys::START_TIME, Local::now());
        let started = Instant::now();
        self.next.call(ctx, w, req).await;
        ctx.set(keys::ELAPSED_TIME, started.elapsed());
    }
}
