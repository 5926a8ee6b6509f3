//! Unified error type.

/// The error type returned by tatami's fallible setup and serve operations.
///
/// Request-level failures (404, 415, 500, ...) are never `Error`s — they are
/// written to the [`ResponseWriter`](crate::ResponseWriter) as HTTP responses
/// and handled by the stage that detects them. This type surfaces what goes
/// wrong before or below the request chain: a route table that cannot be
/// built, an access-log format that cannot be compiled, a socket that cannot
/// be bound.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Binding the listening socket or accepting a connection failed.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// A route pattern failed to register — bad syntax, or a duplicate
    /// (method, pattern) pair.
    #[error("invalid route `{pattern}`: {source}")]
    Route {
        pattern: String,
        #[source]
        source: matchit::InsertError,
    },

    /// An access-log format string contains an unknown `%` directive.
    #[error("unknown access log directive `%{0}`")]
    LogFormat(char),
}
