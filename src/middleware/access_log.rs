//! Apache-style access log.
//!
//! Emits one line per request after the downstream chain completes, driven by
//! a `%`-directive template compiled once at construction. The default is the
//! Common Log Format:
//!
//! ```text
//! 127.0.0.1 - frank 10/Oct/2000:13:55:36 -0700 "GET /apache_pb.gif HTTP/1.0" 200 2326
//! ```
//!
//! The layer only reads what other layers wrote into the context — install
//! [`Timer`](super::Timer) and [`Recorder`](super::Recorder) *inside* it (after
//! it in the stack order) to populate the timestamp, status, and byte count.
//! Missing data never faults: each directive degrades to its placeholder, so
//! a bare stack still logs ` - -  "GET / HTTP/1.1" 0 -`.
//!
//! Supported directives:
//!
//! | | |
//! |---|---|
//! | `%h` | peer IP, blank when unknown |
//! | `%l` | identd user, always `-` |
//! | `%u` | authenticated user, `-` when anonymous |
//! | `%t` | start time as `02/Jan/2006:15:04:05 -0700`, blank without a timer |
//! | `%r` | request line, `GET /path HTTP/1.1` |
//! | `%s` | status code, `0` without a recorder |
//! | `%b` | body bytes, `-` when zero or unrecorded |
//! | `%D` | elapsed microseconds, blank without a timer |
//! | `%T` | elapsed whole seconds, blank without a timer |
//! | `%%` | literal `%` |

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use tracing::info;

use crate::context::{Context, keys};
use crate::error::Error;
use crate::handler::{BoxedHandler, Handler};
use crate::middleware::Middleware;
use crate::request::Request;
use crate::response::ResponseWriter;

/// The Common Log Format: `%h %l %u %t "%r" %s %b`.
pub const COMMON_LOG_FORMAT: &str = "%h %l %u %t \"%r\" %s %b";

// ── Sink ──────────────────────────────────────────────────────────────────────

/// Where finished log lines go.
///
/// The sink is injected at construction — there is no process-wide logger
/// behind the scenes. Closures work directly:
///
/// ```rust
/// use tatami::middleware::AccessLog;
///
/// let log = AccessLog::new().with_sink(|line: &str| eprintln!("{line}"));
/// ```
pub trait LogSink: Send + Sync + 'static {
    fn write_line(&self, line: &str);
}

impl<F> LogSink for F
where
    F: Fn(&str) + Send + Sync + 'static,
{
    fn write_line(&self, line: &str) {
        self(line);
    }
}

/// The default sink: forwards each line to [`tracing`] at `INFO` under the
/// `tatami::access` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn write_line(&self, line: &str) {
        info!(target: "tatami::access", "{line}");
    }
}

// ── Template ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
enum Directive {
    Literal(String),
    RemoteAddr,
    Dash,
    RemoteUser,
    Timestamp,
    RequestLine,
    Status,
    Bytes,
    ElapsedMicros,
    ElapsedSeconds,
}

fn compile(format: &str) -> Result<Vec<Directive>, Error> {
    let mut directives = Vec::new();
    let mut literal = String::new();
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            literal.push(c);
            continue;
        }
        match chars.next() {
            Some('%') => literal.push('%'),
            Some(spec) => {
                if !literal.is_empty() {
                    directives.push(Directive::Literal(std::mem::take(&mut literal)));
                }
                directives.push(match spec {
                    'h' => Directive::RemoteAddr,
                    'l' => Directive::Dash,
                    'u' => Directive::RemoteUser,
                    't' => Directive::Timestamp,
                    'r' => Directive::RequestLine,
                    's' => Directive::Status,
                    'b' => Directive::Bytes,
                    'D' => Directive::ElapsedMicros,
                    'T' => Directive::ElapsedSeconds,
                    other => return Err(Error::LogFormat(other)),
                });
            }
            None => return Err(Error::LogFormat('%')),
        }
    }
    if !literal.is_empty() {
        directives.push(Directive::Literal(literal));
    }
    Ok(directives)
}

fn render(directives: &[Directive], ctx: &Context, req: &Request) -> String {
    let mut line = String::new();
    for directive in directives {
        match directive {
            Directive::Literal(text) => line.push_str(text),
            Directive::RemoteAddr => {
                if let Some(addr) = req.remote_addr() {
                    line.push_str(&addr.ip().to_string());
                }
            }
            Directive::Dash => line.push('-'),
            Directive::RemoteUser => {
                let user = ctx
                    .get::<String>(keys::REMOTE_USER)
                    .map(String::as_str)
                    .unwrap_or("-");
                line.push_str(user);
            }
            Directive::Timestamp => {
                if let Some(start) = ctx.get::<DateTime<Local>>(keys::START_TIME) {
                    line.push_str(&start.format("%d/%b/%Y:%H:%M:%S %z").to_string());
                }
            }
            Directive::RequestLine => line.push_str(&req.request_line()),
            Directive::Status => {
                let status = ctx.get::<u16>(keys::STATUS_CODE).copied().unwrap_or(0);
                line.push_str(&status.to_string());
            }
            Directive::Bytes => match ctx.get::<u64>(keys::BYTES_WRITTEN) {
                Some(&bytes) if bytes > 0 => line.push_str(&bytes.to_string()),
                _ => line.push('-'),
            },
            Directive::ElapsedMicros => {
                if let Some(elapsed) = ctx.get::<Duration>(keys::ELAPSED_TIME) {
                    line.push_str(&elapsed.as_micros().to_string());
                }
            }
            Directive::ElapsedSeconds => {
                if let Some(elapsed) = ctx.get::<Duration>(keys::ELAPSED_TIME) {
                    line.push_str(&elapsed.as_secs().to_string());
                }
            }
        }
    }
    line
}

// ── Middleware ────────────────────────────────────────────────────────────────

/// Access-log layer with an Apache-style line template.
///
/// Install it outermost so the line reflects everything the inner layers
/// recorded.
#[derive(Clone)]
pub struct AccessLog {
    directives: Vec<Directive>,
    sink: Arc<dyn LogSink>,
}

impl AccessLog {
    /// Common Log Format, lines forwarded to [`tracing`].
    pub fn new() -> Self {
        Self {
            directives: compile(COMMON_LOG_FORMAT).expect("common log format compiles"),
            sink: Arc::new(TracingSink),
        }
    }

    /// Uses a custom `%`-directive template instead of the Common Log Format.
    /// Unknown directives are rejected here, at build time.
    pub fn with_format(format: &str) -> Result<Self, Error> {
        Ok(Self { directives: compile(format)?, sink: Arc::new(TracingSink) })
    }

    /// Replaces the line sink.
    pub fn with_sink(mut self, sink: impl LogSink) -> Self {
        self.sink = Arc::new(sink);
        self
    }
}

impl Default for AccessLog {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for AccessLog {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(AccessLogHandler {
            directives: self.directives.clone(),
            sink: Arc::clone(&self.sink),
            next,
        })
    }
}

struct AccessLogHandler {
    directives: Vec<Directive>,
    sink: Arc<dyn LogSink>,
    next: BoxedHandler,
}

#[async_trait]
impl Handler for AccessLogHandler {
    async fn call(&self, ctx: &mut Context, w: &mut ResponseWriter, req: &mut Request) {
        self.next.call(ctx, w, req).await;
        self.sink.write_line(&render(&self.directives, ctx, req));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_directive_is_rejected_at_build_time() {
        assert!(matches!(AccessLog::with_format("%h %q"), Err(Error::LogFormat('q'))));
        assert!(matches!(AccessLog::with_format("trailing %"), Err(Error::LogFormat('%'))));
    }

    #[test]
    fn escaped_percent_is_a_literal() {
        let directives = compile("100%% %s").unwrap();
        let ctx = Context::new();
        let req: Request = http::Request::builder()
            .method(http::Method::GET)
            .uri("/")
            .body(bytes::Bytes::new())
            .unwrap()
            .into();
        assert_eq!(render(&directives, &ctx, &req), "100% 0");
    }
}
