//! Response metadata recording.

use std::sync::Arc;

use async_trait::async_trait;
use http::StatusCode;

use crate::context::{Context, keys};
use crate::handler::{BoxedHandler, Handler};
use crate::middleware::Middleware;
use crate::request::Request;
use crate::response::ResponseWriter;

/// After the downstream chain returns, copies the effective status code into
/// [`keys::STATUS_CODE`] and the body byte count into [`keys::BYTES_WRITTEN`],
/// where the access-log layers read them. An unset status records as 200,
/// matching what [`finish`](ResponseWriter::finish) will send.
#[derive(Clone, Copy, Debug, Default)]
pub struct Recorder;

impl Middleware for Recorder {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(RecorderHandler { next })
    }
}

struct RecorderHandler {
    next: BoxedHandler,
}

#[async_trait]
impl Handler for RecorderHandler {
    async fn call(&self, ctx: &mut Context, w: &mut ResponseWriter, req: &mut Request) {
        self.next.call(ctx, w, req).await;
        ctx.set(keys::STATUS_CODE, w.status().unwrap_or(StatusCode::OK).as_u16());
        ctx.set(keys::BYTES_WRITTEN, w.bytes_written());
    }
}
