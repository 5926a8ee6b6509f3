//! The per-request response writer.
//!
//! Handlers never touch the transport. They write through a [`ResponseWriter`]
//! owned by the single in-flight request; when the chain returns, the server
//! converts the accumulated state into a hyper response with
//! [`finish`](ResponseWriter::finish). Middleware can read the recorded
//! status and byte count on the way out — that is how the recorder and the
//! access log learn what the inner layers did.

use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::{Response, StatusCode};
use http_body_util::Full;
use serde::Serialize;
use tracing::{error, warn};

/// Per-request response state: status, headers, body buffer, byte count.
///
/// Created when a request enters the stack, consumed by
/// [`finish`](ResponseWriter::finish) when the response is flushed. Never
/// shared across requests.
#[derive(Default)]
pub struct ResponseWriter {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
    indent: bool,
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the response status. The status can be set exactly once — a
    /// second call is a programming error, logged and ignored.
    pub fn write_header(&mut self, code: StatusCode) {
        if let Some(current) = self.status {
            warn!(current = %current, ignored = %code, "superfluous write_header call");
            return;
        }
        self.status = Some(code);
    }

    /// The status set so far, or `None` if no layer has written one.
    /// [`finish`](ResponseWriter::finish) treats `None` as 200.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Inserts a response header, replacing any previous value.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Serializes `value` as JSON and appends it to the body.
    ///
    /// Sets `content-type: application/json` unless a content type is already
    /// present, and applies status 200 if no status has been written. The
    /// output is compact by default; the
    /// [`JsonIndent`](crate::middleware::JsonIndent) layer switches it to
    /// 2-space pretty printing.
    pub fn write_json<T: Serialize + ?Sized>(&mut self, value: &T) {
        let encoded = if self.indent {
            serde_json::to_vec_pretty(value)
        } else {
            serde_json::to_vec(value)
        };
        let bytes = match encoded {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("json serialization failed: {e}");
                self.write_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
                return;
            }
        };
        if !self.headers.contains_key(header::CONTENT_TYPE) {
            self.headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json; charset=utf-8"),
            );
        }
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.body.extend_from_slice(&bytes);
    }

    /// Writes the canonical error response: `code` with body
    /// `{"Error":"<message>"}`.
    pub fn write_error(&mut self, code: StatusCode, message: &str) {
        self.write_header(code);
        self.write_json(&ErrorBody { error: message });
    }

    /// `404 {"Error":"Resource not found"}`.
    pub fn not_found(&mut self) {
        self.write_error(StatusCode::NOT_FOUND, "Resource not found");
    }

    /// `405 {"Error":"Method not allowed"}`.
    pub fn method_not_allowed(&mut self) {
        self.write_error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
    }

    /// Body bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.body.len() as u64
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub(crate) fn set_indent(&mut self, on: bool) {
        self.indent = on;
    }

    /// Clears all recorded state so the recovery boundary can emit a clean
    /// 500 after a panic.
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    /// Converts the accumulated state into a hyper-compatible response.
    /// An unset status becomes 200.
    pub fn finish(self) -> Response<Full<Bytes>> {
        let mut response = Response::new(Full::new(Bytes::from(self.body)));
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = self.headers;
        response
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    #[serde(rename = "Error")]
    error: &'a str,
}
