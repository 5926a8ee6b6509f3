//! Radix-tree request router.
//!
//! One tree per HTTP method, O(path-length) lookup via [`matchit`]. Patterns
//! mix literal segments with `:name` parameters: `/users/:id` matches
//! `/users/42` and binds `id = "42"`. Literal segments compare exactly and
//! case-sensitively; a parameter matches any single non-empty segment.
//!
//! When two patterns could both match a path, the most specific wins: a
//! literal segment beats a parameter at the same position, so `/users/me`
//! shadows `/users/:id` for exactly that path. This is matchit's static-first
//! precedence, relied on rather than reimplemented.
//!
//! The route table is built once at startup and immutable afterwards — lookup
//! is `&self` and safe under concurrent requests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use http::Method;
use matchit::Router as MatchitRouter;

use crate::context::{Context, PathParams, keys};
use crate::error::Error;
use crate::handler::{BoxedHandler, Handler};
use crate::request::Request;
use crate::response::ResponseWriter;

/// The application router.
///
/// Registration chains and is fallible — a duplicate (method, pattern) pair
/// or a malformed pattern is reported at build time, not at request time:
///
/// ```rust,no_run
/// # use tatami::{Context, Request, ResponseWriter, Router, handler_fn};
/// # async fn get_user(_: &mut Context, _: &mut ResponseWriter, _: &mut Request) {}
/// # async fn create_user(_: &mut Context, _: &mut ResponseWriter, _: &mut Request) {}
/// # fn main() -> Result<(), tatami::Error> {
/// let router = Router::new()
///     .get("/users/:id", handler_fn(get_user))?
///     .post("/users", handler_fn(create_user))?;
/// # Ok(())
/// # }
/// ```
///
/// The router is itself a [`Handler`]: it resolves the route, stores the
/// bound path parameters in the context under [`keys::PATH_PARAMS`], and
/// delegates — or answers 404/405 itself when nothing matches.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
}

/// Why a lookup produced no handler.
///
/// The two cases map to distinct status codes: a path no pattern matches is
/// 404, a path some *other* method has a handler for is 405.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RouteError {
    NotFound,
    MethodNotAllowed,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    /// Registers a handler for a method + pattern pair.
    pub fn register(
        mut self,
        method: Method,
        pattern: &str,
        handler: impl Handler,
    ) -> Result<Self, Error> {
        self.routes
            .entry(method)
            .or_default()
            .insert(translate_pattern(pattern), Arc::new(handler))
            .map_err(|source| Error::Route { pattern: pattern.to_owned(), source })?;
        Ok(self)
    }

    pub fn get(self, pattern: &str, handler: impl Handler) -> Result<Self, Error> {
        self.register(Method::GET, pattern, handler)
    }

    pub fn post(self, pattern: &str, handler: impl Handler) -> Result<Self, Error> {
        self.register(Method::POST, pattern, handler)
    }

    pub fn put(self, pattern: &str, handler: impl Handler) -> Result<Self, Error> {
        self.register(Method::PUT, pattern, handler)
    }

    pub fn delete(self, pattern: &str, handler: impl Handler) -> Result<Self, Error> {
        self.register(Method::DELETE, pattern, handler)
    }

    pub fn patch(self, pattern: &str, handler: impl Handler) -> Result<Self, Error> {
        self.register(Method::PATCH, pattern, handler)
    }

    pub fn head(self, pattern: &str, handler: impl Handler) -> Result<Self, Error> {
        self.register(Method::HEAD, pattern, handler)
    }

    /// Resolves `method` + `path` to a registered handler and the path
    /// parameters it binds.
    ///
    /// Distinguishes "no pattern matches this path" from "a pattern matches,
    /// but under a different method" — the latter is
    /// [`RouteError::MethodNotAllowed`].
    pub fn match_route(
        &self,
        method: &Method,
        path: &str,
    ) -> Result<(BoxedHandler, PathParams), RouteError> {
        if let Some(tree) = self.routes.get(method) {
            if let Ok(matched) = tree.at(path) {
                return Ok((Arc::clone(matched.value), PathParams::from(matched.params)));
            }
        }
        let other_method_matches = self
            .routes
            .iter()
            .any(|(m, tree)| m != method && tree.at(path).is_ok());
        if other_method_matches {
            Err(RouteError::MethodNotAllowed)
        } else {
            Err(RouteError::NotFound)
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Handler for Router {
    async fn call(&self, ctx: &mut Context, w: &mut ResponseWriter, req: &mut Request) {
        match self.match_route(req.method(), req.path()) {
            Ok((handler, params)) => {
                ctx.set(keys::PATH_PARAMS, params);
                handler.call(ctx, w, req).await;
            }
            Err(RouteError::NotFound) => w.not_found(),
            Err(RouteError::MethodNotAllowed) => w.method_not_allowed(),
        }
    }
}

/// Rewrites `:name` parameter segments into matchit's `{name}` syntax.
fn translate_pattern(pattern: &str) -> String {
    pattern
        .split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) => format!("{{{name}}}"),
            None => segment.to_owned(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;

    async fn noop(_ctx: &mut Context, _w: &mut ResponseWriter, _req: &mut Request) {}

    #[test]
    fn translates_parameter_segments() {
        assert_eq!(translate_pattern("/users/:id/posts/:post"), "/users/{id}/posts/{post}");
        assert_eq!(translate_pattern("/healthz"), "/healthz");
    }

    #[test]
    fn distinguishes_not_found_from_method_not_allowed() {
        let router = Router::new().get("/r/:id", handler_fn(noop)).unwrap();

        assert!(router.match_route(&Method::GET, "/r/1").is_ok());
        assert!(matches!(
            router.match_route(&Method::DELETE, "/r/1"),
            Err(RouteError::MethodNotAllowed)
        ));
        assert!(matches!(
            router.match_route(&Method::GET, "/nope"),
            Err(RouteError::NotFound)
        ));
    }

    #[test]
    fn binds_named_segments() {
        let router = Router::new().get("/users/:id", handler_fn(noop)).unwrap();
        let (_, params) = router.match_route(&Method::GET, "/users/42").unwrap();
        assert_eq!(params.get("id"), Some("42"));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let result = Router::new()
            .get("/r/:id", handler_fn(noop))
            .unwrap()
            .get("/r/:id", handler_fn(noop));
        assert!(matches!(result, Err(Error::Route { .. })));
    }
}
