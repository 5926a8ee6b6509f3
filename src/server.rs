//! HTTP serving loop.
//!
//! A deliberately thin shim between hyper and the middleware stack: accept a
//! connection, spawn a task for it, and for each request on the connection
//! build the per-request trio — [`Context`], [`ResponseWriter`], [`Request`]
//! — run the composed handler, and flush the writer. Everything interesting
//! happens inside the stack.
//!
//! TLS, rate limiting, slow-client protection, and body-size limits belong to
//! the reverse proxy in front of the process, not here. Cancellation is the
//! transport's concern too: when a client goes away, hyper drops the request
//! future, and the drop propagates straight down the chain.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::context::Context;
use crate::error::Error;
use crate::handler::BoxedHandler;
use crate::request::Request;
use crate::response::ResponseWriter;
use crate::StatusCode;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { addr }
    }

    /// Starts accepting connections and dispatching requests through
    /// `handler` — typically the output of
    /// [`Api::make_handler`](crate::Api::make_handler).
    ///
    /// Runs until the listening socket fails.
    pub async fn serve(self, handler: BoxedHandler) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;

        info!(addr = %self.addr, "tatami listening");

        loop {
            let (stream, remote_addr) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("accept error: {e}");
                    continue;
                }
            };

            let handler = Arc::clone(&handler);
            // TokioIo adapts tokio's AsyncRead/AsyncWrite to the hyper IO
            // traits.
            let io = TokioIo::new(stream);

            tokio::spawn(async move {
                // `service_fn` is called once per request on the connection,
                // not once per connection.
                let svc = service_fn(move |req| {
                    let handler = Arc::clone(&handler);
                    async move { dispatch(handler, req, remote_addr).await }
                });

                // `auto::Builder` handles both HTTP/1.1 and HTTP/2 — whatever
                // the client negotiates.
                if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                    .serve_connection(io, svc)
                    .await
                {
                    error!(peer = %remote_addr, "connection error: {e}");
                }
            });
        }
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Runs one request through the composed handler.
///
/// The error type is [`Infallible`]: every failure has already been turned
/// into a response by the time the chain returns, so hyper never sees an
/// error from us.
async fn dispatch(
    handler: BoxedHandler,
    req: hyper::Request<hyper::body::Incoming>,
    remote_addr: SocketAddr,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();

    // The chain works on a buffered body; collect it up front so payload
    // decoding inside handlers is synchronous.
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(peer = %remote_addr, "failed to read request body: {e}");
            let mut w = ResponseWriter::new();
            w.write_error(StatusCode::BAD_REQUEST, "Failed to read request body");
            return Ok(w.finish());
        }
    };

    let mut request =
        Request::from(http::Request::from_parts(parts, body)).with_remote_addr(remote_addr);
    let mut ctx = Context::new();
    let mut w = ResponseWriter::new();

    handler.call(&mut ctx, &mut w, &mut request).await;

    Ok(w.finish())
}
