//! Access-log line shape: the Common Log Format with a full instrumentation
//! stack, graceful degradation without one, and the structured JSON variant.

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use http::Method;
use regex::Regex;
use tatami::middleware::{AccessLog, AccessLogJson, Recorder, Timer};
use tatami::{Api, BoxedHandler, Context, Request, ResponseWriter, handler_fn};

type Lines = Arc<Mutex<Vec<String>>>;

fn capture() -> (Lines, impl Fn(&str) + Send + Sync + 'static) {
    let lines: Lines = Arc::new(Mutex::new(Vec::new()));
    let sink_lines = Arc::clone(&lines);
    (lines, move |line: &str| {
        sink_lines.lock().unwrap().push(line.to_owned())
    })
}

fn request() -> Request {
    http::Request::builder()
        .method(Method::GET)
        .uri("/")
        .body(Bytes::new())
        .unwrap()
        .into()
}

async fn run(handler: &BoxedHandler, mut req: Request) -> ResponseWriter {
    let mut ctx = Context::new();
    let mut w = ResponseWriter::new();
    handler.call(&mut ctx, &mut w, &mut req).await;
    w
}

async fn simple(_ctx: &mut Context, w: &mut ResponseWriter, _req: &mut Request) {
    w.write_json(&serde_json::json!({ "Id": "123" }));
}

#[tokio::test]
async fn common_log_format_with_full_instrumentation() {
    let (lines, sink) = capture();

    let app = Api::new()
        .using(AccessLog::new().with_sink(sink))
        .using(Timer)
        .using(Recorder)
        .make_handler(handler_fn(simple));

    let req = request().with_remote_addr("127.0.0.1:1234".parse().unwrap());
    run(&app, req).await;

    let lines = lines.lock().unwrap();
    assert_eq!(lines.len(), 1);

    // e.g. 127.0.0.1 - - 29/Nov/2014:22:28:34 +0000 "GET / HTTP/1.1" 200 12
    let clf = Regex::new(
        r#"^127\.0\.0\.1 - - \d{2}/\w{3}/\d{4}:\d{2}:\d{2}:\d{2} [+-]\d{4} "GET / HTTP/1\.1" 200 12$"#,
    )
    .unwrap();
    assert!(clf.is_match(&lines[0]), "got: {}", lines[0]);
}

#[tokio::test]
async fn missing_instrumentation_degrades_to_placeholders() {
    let (lines, sink) = capture();

    // no timer, no recorder, no remote address
    let app = Api::new()
        .using(AccessLog::new().with_sink(sink))
        .make_handler(handler_fn(simple));

    run(&app, request()).await;

    let lines = lines.lock().unwrap();
    assert_eq!(lines[0], r#" - -  "GET / HTTP/1.1" 0 -"#);
}

#[tokio::test]
async fn elapsed_time_directives_render_with_a_timer() {
    let (lines, sink) = capture();

    let app = Api::new()
        .using(AccessLog::with_format("%D %T").unwrap().with_sink(sink))
        .using(Timer)
        .make_handler(handler_fn(simple));

    run(&app, request()).await;

    let lines = lines.lock().unwrap();
    let micros_and_secs = Regex::new(r"^\d+ \d+$").unwrap();
    assert!(micros_and_secs.is_match(&lines[0]), "got: {}", lines[0]);
}

#[tokio::test]
async fn json_access_log_emits_one_record_per_request() {
    let (lines, sink) = capture();

    let app = Api::new()
        .using(AccessLogJson::new().with_sink(sink))
        .using(Timer)
        .using(Recorder)
        .make_handler(handler_fn(simple));

    let req = request().with_remote_addr("10.0.0.9:40000".parse().unwrap());
    run(&app, req).await;

    let lines = lines.lock().unwrap();
    assert_eq!(lines.len(), 1);

    let record: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(record["method"], "GET");
    assert_eq!(record["path"], "/");
    assert_eq!(record["proto"], "HTTP/1.1");
    assert_eq!(record["status"], 200);
    assert_eq!(record["bytes"], 12);
    assert_eq!(record["remote_addr"], "10.0.0.9");
    assert!(record["timestamp"].is_string());
    assert!(record["elapsed_us"].is_number());
}
