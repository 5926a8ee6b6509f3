//! Structured JSON access log.
//!
//! Same data as the Apache-style layer, one JSON object per request instead
//! of a text line. Convenient for log pipelines that would otherwise re-parse
//! the Common Log Format.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::Serialize;

use crate::context::{Context, keys};
use crate::handler::{BoxedHandler, Handler};
use crate::middleware::access_log::{LogSink, TracingSink};
use crate::middleware::Middleware;
use crate::request::Request;
use crate::response::ResponseWriter;

/// Access-log layer emitting one JSON record per request.
///
/// Like [`AccessLog`](super::AccessLog), it reads the context after the
/// downstream chain returns and tolerates missing instrumentation: absent
/// fields serialize as `null`, status defaults to 0 and bytes to 0.
#[derive(Clone)]
pub struct AccessLogJson {
    sink: Arc<dyn LogSink>,
}

impl AccessLogJson {
    pub fn new() -> Self {
        Self { sink: Arc::new(TracingSink) }
    }

    /// Replaces the record sink.
    pub fn with_sink(mut self, sink: impl LogSink) -> Self {
        self.sink = Arc::new(sink);
        self
    }
}

impl Default for AccessLogJson {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for AccessLogJson {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(AccessLogJsonHandler { sink: Arc::clone(&self.sink), next })
    }
}

#[derive(Serialize)]
struct AccessRecord<'a> {
    timestamp: Option<String>,
    remote_addr: Option<String>,
    remote_user: Option<&'a str>,
    method: &'a str,
    path: &'a str,
    proto: &'a str,
    status: u16,
    bytes: u64,
    elapsed_us: Option<u64>,
}

struct AccessLogJsonHandler {
    sink: Arc<dyn LogSink>,
    next: BoxedHandler,
}

#[async_trait]
impl Handler for AccessLogJsonHandler {
    async fn call(&self, ctx: &mut Context, w: &mut ResponseWriter, req: &mut Request) {
        self.next.call(ctx, w, req).await;

        let record = AccessRecord {
            timestamp: ctx
                .get::<DateTime<Local>>(keys::START_TIME)
                .map(|start| start.to_rfc3339()),
            remote_addr: req.remote_addr().map(|addr| addr.ip().to_string()),
            remote_user: ctx.get::<String>(keys::REMOTE_USER).map(String::as_str),
            method: req.method().as_str(),
            path: req.path(),
            proto: req.proto(),
            status: ctx.get::<u16>(keys::STATUS_CODE).copied().unwrap_or(0),
            bytes: ctx.get::<u64>(keys::BYTES_WRITTEN).copied().unwrap_or(0),
            elapsed_us: ctx
                .get::<Duration>(keys::ELAPSED_TIME)
                .map(|elapsed| elapsed.as_micros() as u64),
        };
        if let Ok(line) = serde_json::to_string(&record) {
            self.sink.write_line(&line);
        }
    }
}
