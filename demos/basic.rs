//! Minimal tatami example — CRUD-style JSON endpoints behind a middleware
//! stack.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users/42
//!   curl -X POST http://localhost:3000/users \
//!        -H 'content-type: application/json' \
//!        -d '{"name":"alice"}'
//!   curl -X DELETE http://localhost:3000/users/42
//!   curl http://localhost:3000/healthz

use serde::Deserialize;
use tatami::middleware::{AccessLog, JsonIndent, PoweredBy, Recorder, Timer};
use tatami::{
    Api, Context, Error, Request, ResponseWriter, Router, Server, StatusCode, handler_fn, health,
};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let router = Router::new()
        .get("/users/:id", handler_fn(get_user))?
        .post("/users", handler_fn(create_user))?
        .delete("/users/:id", handler_fn(delete_user))?
        .get("/healthz", handler_fn(health::liveness))?
        .get("/readyz", handler_fn(health::readiness))?;

    // First layer is outermost: the access log sees what the timer and
    // recorder wrote on the way back out.
    let api = Api::new()
        .using(AccessLog::new())
        .using(Timer)
        .using(Recorder)
        .using(PoweredBy::default())
        .using(JsonIndent);

    Server::bind("0.0.0.0:3000").serve(api.make_handler(router)).await
}

#[derive(Deserialize)]
struct CreateUser {
    name: String,
}

// GET /users/:id
async fn get_user(ctx: &mut Context, w: &mut ResponseWriter, _req: &mut Request) {
    let id = ctx.path_param("id").unwrap_or("unknown").to_owned();
    w.write_json(&serde_json::json!({ "id": id, "name": "alice" }));
}

// POST /users
async fn create_user(_ctx: &mut Context, w: &mut ResponseWriter, req: &mut Request) {
    let input: CreateUser = match req.decode_json_payload() {
        Ok(input) => input,
        Err(e) => return w.write_error(e.status(), &e.to_string()),
    };

    w.write_header(StatusCode::CREATED);
    w.write_json(&serde_json::json!({ "id": "99", "name": input.name }));
}

// DELETE /users/:id → 204 No Content
async fn delete_user(_ctx: &mut Context, w: &mut ResponseWriter, _req: &mut Request) {
    w.write_header(StatusCode::NO_CONTENT);
}
