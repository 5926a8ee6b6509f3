//! Built-in middleware layers.
//!
//! A middleware wraps the next stage at build time and decides whether, when,
//! and how many times to invoke it. Exactly once is the usual discipline;
//! zero times short-circuits the chain, which is how
//! [`AuthBasic`](AuthBasic) answers 401 without running the application.
//!
//! Instances hold read-only configuration shared by every request; all
//! per-request state lives in the [`Context`](crate::Context) and the
//! [`ResponseWriter`](crate::ResponseWriter) threaded through
//! [`Handler::call`](crate::Handler::call).
//!
//! The built-in set, in the order a typical stack installs them:
//!
//! | Layer | On the way in | On the way out |
//! |---|---|---|
//! | [`AccessLog`] / [`AccessLogJson`] | — | emits one log line |
//! | [`Timer`] | records the start time | records the elapsed time |
//! | [`Recorder`] | — | copies status + byte count into the context |
//! | [`PoweredBy`] | sets `X-Powered-By` | — |
//! | [`AuthBasic`] | authenticates, or answers 401 | — |
//! | [`JsonIndent`] | switches output to pretty printing | — |

use crate::handler::BoxedHandler;

mod access_log;
mod access_log_json;
mod auth_basic;
mod json_indent;
mod powered_by;
mod recorder;
mod timer;

pub use access_log::{AccessLog, COMMON_LOG_FORMAT, LogSink, TracingSink};
pub use access_log_json::AccessLogJson;
pub use auth_basic::AuthBasic;
pub use json_indent::JsonIndent;
pub use powered_by::PoweredBy;
pub use recorder::Recorder;
pub use timer::Timer;

/// A composable request-processing layer.
///
/// `wrap` runs once, at stack-build time, and returns a handler that owns the
/// `next` stage. See [`Api::make_handler`](crate::Api::make_handler) for the
/// composition order.
pub trait Middleware: Send + Sync + 'static {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler;
}
