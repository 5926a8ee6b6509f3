//! `X-Powered-By` response header.

use std::sync::Arc;

use async_trait::async_trait;
use http::header::{HeaderName, HeaderValue};

use crate::context::Context;
use crate::handler::{BoxedHandler, Handler};
use crate::middleware::Middleware;
use crate::request::Request;
use crate::response::ResponseWriter;

const X_POWERED_BY: HeaderName = HeaderName::from_static("x-powered-by");

/// Sets an `X-Powered-By` header on every response. Defaults to `tatami`.
#[derive(Clone)]
pub struct PoweredBy {
    value: HeaderValue,
}

impl PoweredBy {
    /// # Panics
    ///
    /// Panics if `value` contains characters that are not valid in a header
    /// value.
    pub fn new(value: &str) -> Self {
        Self {
            value: HeaderValue::from_str(value).expect("valid X-Powered-By header value"),
        }
    }
}

impl Default for PoweredBy {
    fn default() -> Self {
        Self { value: HeaderValue::from_static("tatami") }
    }
}

impl Middleware for PoweredBy {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(PoweredByHandler { value: self.value.clone(), next })
    }
}

struct PoweredByHandler {
    value: HeaderValue,
    next: BoxedHandler,
}

#[async_trait]
impl Handler for PoweredByHandler {
    async fn call(&self, ctx: &mut Context, w: &mut ResponseWriter, req: &mut Request) {
        w.set_header(X_POWERED_BY, self.value.clone());
        self.next.call(ctx, w, req).await;
    }
}
