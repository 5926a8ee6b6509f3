//! Per-request key/value store.
//!
//! Every middleware layer and the final handler see the same [`Context`],
//! threaded down the call chain as an explicit `&mut` parameter. Nothing is
//! ambient and nothing is global: the context is created when a request
//! enters the stack and dropped when its response is flushed, so state can
//! never leak between concurrent requests.
//!
//! Layers communicate through conventional keys — the access log reads what
//! the timer and recorder wrote. The well-known names live in [`keys`].
//! Writes are last-write-wins; there is no collision handling beyond that.

use std::any::Any;
use std::collections::HashMap;

/// Well-known context keys used by the built-in middleware.
pub mod keys {
    /// Authenticated user id (`String`), set by
    /// [`AuthBasic`](crate::middleware::AuthBasic).
    pub const REMOTE_USER: &str = "REMOTE_USER";
    /// Named path segments ([`PathParams`](super::PathParams)), set by the
    /// [`Router`](crate::Router) before it delegates to the matched handler.
    pub const PATH_PARAMS: &str = "PATH_PARAMS";
    /// Wall-clock request start (`chrono::DateTime<Local>`), set by
    /// [`Timer`](crate::middleware::Timer).
    pub const START_TIME: &str = "START_TIME";
    /// Downstream processing duration (`std::time::Duration`), set by
    /// [`Timer`](crate::middleware::Timer).
    pub const ELAPSED_TIME: &str = "ELAPSED_TIME";
    /// Final response status (`u16`), set by
    /// [`Recorder`](crate::middleware::Recorder).
    pub const STATUS_CODE: &str = "STATUS_CODE";
    /// Response body size (`u64`), set by
    /// [`Recorder`](crate::middleware::Recorder).
    pub const BYTES_WRITTEN: &str = "BYTES_WRITTEN";
}

/// Request-scoped bag of typed values.
///
/// Keys are plain strings; values are anything `Any + Send`. A read with the
/// wrong type behaves like a missing key.
#[derive(Default)]
pub struct Context {
    values: HashMap<&'static str, Box<dyn Any + Send>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set<T: Any + Send>(&mut self, key: &'static str, value: T) {
        self.values.insert(key, Box::new(value));
    }

    /// Returns the value stored under `key`, if present and of type `T`.
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.values.get(key).and_then(|value| value.downcast_ref())
    }

    pub fn get_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.values.get_mut(key).and_then(|value| value.downcast_mut())
    }

    /// Shorthand for a named path segment bound by the router.
    ///
    /// For a route `/users/:id`, `ctx.path_param("id")` on `/users/42`
    /// returns `Some("42")`.
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.get::<PathParams>(keys::PATH_PARAMS).and_then(|params| params.get(name))
    }
}

/// Named path segments extracted by the router.
#[derive(Debug, Default, Clone)]
pub struct PathParams {
    params: HashMap<String, String>,
}

impl PathParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl<'k, 'v> From<matchit::Params<'k, 'v>> for PathParams {
    fn from(params: matchit::Params<'k, 'v>) -> Self {
        Self { params: params.iter().map(|(k, v)| (k.to_owned(), v.to_owned())).collect() }
    }
}
