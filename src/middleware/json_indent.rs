//! Pretty-printed JSON output.

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::Context;
use crate::handler::{BoxedHandler, Handler};
use crate::middleware::Middleware;
use crate::request::Request;
use crate::response::ResponseWriter;

/// Switches [`write_json`](ResponseWriter::write_json) from compact output to
/// 2-space-indented pretty printing for every layer inside it.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonIndent;

impl Middleware for JsonIndent {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(JsonIndentHandler { next })
    }
}

struct JsonIndentHandler {
    next: BoxedHandler,
}

#[async_trait]
impl Handler for JsonIndentHandler {
    async fn call(&self, ctx: &mut Context, w: &mut ResponseWriter, req: &mut Request) {
        w.set_indent(true);
        self.next.call(ctx, w, req).await;
    }
}
