//! Incoming HTTP request type and JSON payload decoding.

use std::net::SocketAddr;

use bytes::Bytes;
use http::header::{self, HeaderMap};
use http::{Method, Uri, Version};
use mime::Mime;
use serde::de::DeserializeOwned;

use crate::StatusCode;

/// An incoming HTTP request.
///
/// The transport collects the body before the middleware stack runs, so
/// reading it is synchronous. The body is a one-shot resource:
/// [`decode_json_payload`](Request::decode_json_payload) consumes it, and a
/// second read reports an empty payload.
pub struct Request {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    remote_addr: Option<SocketAddr>,
    body: Option<Bytes>,
}

impl Request {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// The request path, without query string.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Case-insensitive header lookup. Returns `None` for absent headers and
    /// for values that are not valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Peer address, when the transport knows it.
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// Consumes the body and deserializes it as JSON.
    ///
    /// Content negotiation happens here: the request must carry
    /// `Content-Type: application/json`, either with no charset parameter or
    /// with an explicit UTF-8 charset (any case). Anything else is a
    /// [`PayloadError::ContentType`], which maps to HTTP 415. An absent,
    /// empty, or already-consumed body is a [`PayloadError::Empty`].
    pub fn decode_json_payload<T: DeserializeOwned>(&mut self) -> Result<T, PayloadError> {
        self.check_content_type()?;
        let body = self
            .body
            .take()
            .filter(|body| !body.is_empty())
            .ok_or(PayloadError::Empty)?;
        Ok(serde_json::from_slice(&body)?)
    }

    fn check_content_type(&self) -> Result<(), PayloadError> {
        let value = self
            .header(header::CONTENT_TYPE.as_str())
            .ok_or(PayloadError::ContentType)?;
        let mime: Mime = value.parse().map_err(|_| PayloadError::ContentType)?;
        if mime.type_() != mime::APPLICATION || mime.subtype() != mime::JSON {
            return Err(PayloadError::ContentType);
        }
        match mime.get_param(mime::CHARSET) {
            None => Ok(()),
            Some(charset) if charset.as_str().eq_ignore_ascii_case("utf-8") => Ok(()),
            Some(_) => Err(PayloadError::ContentType),
        }
    }

    /// First line of the request, as the access log prints it:
    /// `GET /users/42 HTTP/1.1`.
    pub(crate) fn request_line(&self) -> String {
        let target = self
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| self.uri.path());
        format!("{} {} {}", self.method, target, self.proto())
    }

    pub(crate) fn proto(&self) -> &'static str {
        match self.version {
            Version::HTTP_09 => "HTTP/0.9",
            Version::HTTP_10 => "HTTP/1.0",
            Version::HTTP_11 => "HTTP/1.1",
            Version::HTTP_2 => "HTTP/2.0",
            Version::HTTP_3 => "HTTP/3.0",
            _ => "HTTP/?",
        }
    }
}

impl From<http::Request<Bytes>> for Request {
    fn from(req: http::Request<Bytes>) -> Self {
        let (parts, body) = req.into_parts();
        Self {
            method: parts.method,
            uri: parts.uri,
            version: parts.version,
            headers: parts.headers,
            remote_addr: None,
            body: Some(body),
        }
    }
}

// ── Payload errors ────────────────────────────────────────────────────────────

/// What went wrong while decoding a JSON request body.
///
/// The `Display` text is written verbatim into the `{"Error": …}` response
/// body; [`status`](PayloadError::status) supplies the matching status code,
/// so a handler can reply with
/// `w.write_error(err.status(), &err.to_string())`.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    /// The request's `Content-Type` is not JSON, or declares a non-UTF-8
    /// charset.
    #[error("Bad Content-Type or charset, expected 'application/json'")]
    ContentType,

    /// The body is absent, zero-length, or was already consumed.
    #[error("JSON payload is empty")]
    Empty,

    /// The body is not valid JSON for the requested type.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl PayloadError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::ContentType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Empty | Self::Json(_) => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn post(content_type: Option<&str>, body: &str) -> Request {
        let mut builder = http::Request::builder().method(Method::POST).uri("/r/1");
        if let Some(value) = content_type {
            builder = builder.header(header::CONTENT_TYPE, value);
        }
        builder
            .body(Bytes::copy_from_slice(body.as_bytes()))
            .unwrap()
            .into()
    }

    #[test]
    fn accepts_json_without_charset() {
        let mut req = post(Some("application/json"), r#"{"Test":"Test"}"#);
        let data: HashMap<String, String> = req.decode_json_payload().unwrap();
        assert_eq!(data["Test"], "Test");
    }

    #[test]
    fn accepts_utf8_charset_case_insensitively() {
        let mut req = post(Some("application/json;charset=UTF-8"), r#"{"Test":"Test"}"#);
        assert!(req.decode_json_payload::<HashMap<String, String>>().is_ok());
    }

    #[test]
    fn rejects_non_json_content_type() {
        let mut req = post(Some("text/html"), r#"{"Test":"Test"}"#);
        let err = req.decode_json_payload::<HashMap<String, String>>().unwrap_err();
        assert_eq!(err.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(
            err.to_string(),
            "Bad Content-Type or charset, expected 'application/json'"
        );
    }

    #[test]
    fn rejects_non_utf8_charset() {
        let mut req = post(
            Some("application/json; charset=ISO-8859-1"),
            r#"{"Test":"Test"}"#,
        );
        let err = req.decode_json_payload::<HashMap<String, String>>().unwrap_err();
        assert_eq!(err.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn rejects_missing_content_type() {
        let mut req = post(None, r#"{"Test":"Test"}"#);
        let err = req.decode_json_payload::<HashMap<String, String>>().unwrap_err();
        assert_eq!(err.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn empty_body_is_reported() {
        let mut req = post(Some("application/json"), "");
        let err = req.decode_json_payload::<HashMap<String, String>>().unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "JSON payload is empty");
    }

    #[test]
    fn body_is_a_one_shot_read() {
        let mut req = post(Some("application/json"), r#"{"Test":"Test"}"#);
        req.decode_json_payload::<HashMap<String, String>>().unwrap();

        let err = req.decode_json_payload::<HashMap<String, String>>().unwrap_err();
        assert!(matches!(err, PayloadError::Empty));
    }

    #[test]
    fn request_line_includes_query() {
        let req: Request = http::Request::builder()
            .method(Method::GET)
            .uri("/users/42?page=2")
            .body(Bytes::new())
            .unwrap()
            .into();
        assert_eq!(req.request_line(), "GET /users/42?page=2 HTTP/1.1");
    }
}
