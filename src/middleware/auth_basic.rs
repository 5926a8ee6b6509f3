//! HTTP Basic authentication (RFC 7617).
//!
//! Two gates run before the downstream chain: the **authenticator** checks
//! the credentials, the optional **authorizer** checks whether that user may
//! perform this particular request. Failing either gate answers
//! `401 {"Error":"Not Authorized"}` with a `WWW-Authenticate` challenge and
//! never invokes downstream. Passing both stores the user id in the context
//! under [`keys::REMOTE_USER`] and delegates.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use http::StatusCode;
use http::header::{self, HeaderValue};

use crate::context::{Context, keys};
use crate::handler::{BoxedHandler, Handler};
use crate::middleware::Middleware;
use crate::request::Request;
use crate::response::ResponseWriter;

type Authenticator = Arc<dyn Fn(&str, &str) -> bool + Send + Sync>;
type Authorizer = Arc<dyn Fn(&str, &Request) -> bool + Send + Sync>;

/// Basic-auth layer.
///
/// ```rust
/// use tatami::middleware::AuthBasic;
///
/// let auth = AuthBasic::new("api", |user, password| {
///     user == "admin" && password == "admin"
/// })
/// .with_authorizer(|_user, req| req.method() == http::Method::GET);
/// ```
#[derive(Clone)]
pub struct AuthBasic {
    challenge: HeaderValue,
    authenticator: Authenticator,
    authorizer: Option<Authorizer>,
}

impl AuthBasic {
    /// Creates the layer with a realm and a credential check.
    ///
    /// # Panics
    ///
    /// Panics if `realm` contains characters that are not valid in a header
    /// value.
    pub fn new(realm: &str, authenticator: impl Fn(&str, &str) -> bool + Send + Sync + 'static) -> Self {
        let challenge = HeaderValue::from_str(&format!("Basic realm=\"{realm}\""))
            .expect("realm is a valid header value");
        Self {
            challenge,
            authenticator: Arc::new(authenticator),
            authorizer: None,
        }
    }

    /// Adds a per-request policy applied after the credentials check, e.g. a
    /// method-based rule. The first argument is the authenticated user id.
    pub fn with_authorizer(
        mut self,
        authorizer: impl Fn(&str, &Request) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.authorizer = Some(Arc::new(authorizer));
        self
    }
}

impl Middleware for AuthBasic {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(AuthBasicHandler { auth: self.clone(), next })
    }
}

struct AuthBasicHandler {
    auth: AuthBasic,
    next: BoxedHandler,
}

impl AuthBasicHandler {
    /// Extracts and verifies `Authorization: Basic …`. Any defect — missing
    /// header, wrong scheme, undecodable base64, missing colon, refused
    /// credentials — collapses to `None`; the response is the same 401 in
    /// every case, so the client learns nothing about which check failed.
    fn authenticate(&self, req: &Request) -> Option<String> {
        let value = req.header(header::AUTHORIZATION.as_str())?;
        let (scheme, payload) = value.split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }
        let decoded = BASE64.decode(payload.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (user, password) = decoded.split_once(':')?;
        (self.auth.authenticator)(user, password).then(|| user.to_owned())
    }

    fn challenge(&self, w: &mut ResponseWriter) {
        w.set_header(header::WWW_AUTHENTICATE, self.auth.challenge.clone());
        w.write_error(StatusCode::UNAUTHORIZED, "Not Authorized");
    }
}

#[async_trait]
impl Handler for AuthBasicHandler {
    async fn call(&self, ctx: &mut Context, w: &mut ResponseWriter, req: &mut Request) {
        let Some(user) = self.authenticate(req) else {
            self.challenge(w);
            return;
        };
        if let Some(authorizer) = &self.auth.authorizer {
            if !authorizer(&user, req) {
                self.challenge(w);
                return;
            }
        }
        ctx.set(keys::REMOTE_USER, user);
        self.next.call(ctx, w, req).await;
    }
}
