//! Integration tests for the engine against an in-process API.
//!
//! The API is a `tower::service_fn` driven through `ServiceTransport`, so
//! every request goes through the real hyper request/response types without
//! opening a socket.

use bytes::Bytes;
use chrono::{Duration, SecondsFormat, Utc};
use http_body_util::{BodyExt, Full};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Method, Request, Response, StatusCode};
use restmatch::{
    Engine, EngineConfig, Error, ErrorPolicy, Expected, ServiceTransport, TestCase, TestRequest,
    TestResponse, TransportError, TransportRequest, TransportResponse, Value, YamlCodec,
};
use serde_json::json;
use std::convert::Infallible;
use std::sync::{Arc, Mutex, Once};

static INIT: Once = Once::new();

/// Route engine logs to the test output. Set `RUST_LOG=restmatch=debug` to see them.
fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

#[derive(Default)]
struct PetStore {
    users: Vec<serde_json::Value>,
    cats: Vec<serde_json::Value>,
}

fn json_reply(status: StatusCode, body: serde_json::Value) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body.to_string())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

async fn handle(
    store: Arc<Mutex<PetStore>>,
    req: Request<Full<Bytes>>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let authorized = req.headers().get("authorization").is_some();
    let body = req.into_body().collect().await?.to_bytes();
    let input: serde_json::Value = serde_json::from_slice(&body).unwrap_or_default();

    if !authorized {
        return Ok(json_reply(
            StatusCode::UNAUTHORIZED,
            json!({"error": "missing credentials"}),
        ));
    }

    let mut store = store.lock().unwrap();
    let reply = match (method, path.as_str()) {
        (Method::POST, "/api/user") => {
            let user = json!({
                "id": format!("u{}", store.users.len() + 1),
                "name": input["name"],
                "age": input["age"],
                "pets": [],
            });
            store.users.push(user.clone());
            json_reply(StatusCode::CREATED, user)
        }
        (Method::POST, "/api/cat") => {
            let cat = json!({
                "id": 123 + store.cats.len(),
                "name": input["name"],
                "owner": input["owner"],
                "born": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                "weight": 4.2,
            });
            store.cats.push(cat.clone());
            json_reply(StatusCode::CREATED, cat)
        }
        (Method::GET, path) if path.starts_with("/api/cat/") => {
            let id = &path["/api/cat/".len()..];
            match store.cats.iter().find(|cat| cat["id"].to_string() == id) {
                Some(cat) => json_reply(StatusCode::OK, cat.clone()),
                None => json_reply(StatusCode::NOT_FOUND, json!({"error": "no such cat"})),
            }
        }
        (Method::GET, "/health") => {
            let mut response = Response::new(Full::new(Bytes::from_static(b"ok")));
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
            response
        }
        _ => json_reply(StatusCode::NOT_FOUND, json!({"error": "not found"})),
    };
    Ok(reply)
}

fn engine() -> Engine {
    init_tracing();
    let store = Arc::new(Mutex::new(PetStore::default()));
    let service = tower::service_fn(move |req| handle(Arc::clone(&store), req));
    let transport = ServiceTransport::new(service);
    let mut engine = Engine::new().with_transport(transport);
    engine
        .set_default_header("Authorization", "Bearer secret")
        .unwrap();
    engine
}

#[test]
fn test_user_and_cat_flow() {
    let mut engine = engine();

    engine.assert(&TestCase::new(
        TestRequest::post("/api/user").json(json!({"name": "John", "age": 51})),
        TestResponse::status(201)
            .headers(Expected::partial([(
                "Content-Type",
                vec!["application/json"],
            )]))
            .body(Expected::map([
                ("id", Expected::from("$userid$")),
                ("name", Expected::from("John")),
                ("age", Expected::number_delta(50.0, 2.0)),
                ("pets", Expected::seq(Vec::<Expected>::new())),
            ])),
    ));
    assert_eq!(engine.variable_string("userid"), "u1");

    engine.assert(&TestCase::new(
        TestRequest::post("/api/cat").text(r#"{"name": "Pepper the cat", "owner": "_userid_"}"#),
        TestResponse::status(201).body(Expected::partial([
            ("id", Expected::store("catid")),
            ("owner", Expected::load("userid")),
            ("born", Expected::time_delta(Utc::now(), Duration::seconds(10))),
        ])),
    ));
    assert_eq!(engine.variable("catid"), Some(&Value::Int(123)));

    engine.assert(&TestCase::new(
        TestRequest::get("/api/cat/_catid_"),
        TestResponse::status(200).body(Expected::partial([
            ("id", Expected::load("catid")),
            ("name", Expected::capture(r"^(\w+) the (\w+)$", [(1, "catname"), (2, "species")])),
            ("weight", Expected::number_delta(4.0, 0.5)),
        ])),
    ));
    assert_eq!(engine.variable_string("catname"), "Pepper");
    assert_eq!(engine.variable_string("species"), "cat");
}

#[test]
fn test_request_header_overrides_default() {
    let mut engine = engine();
    engine.set_variable("token", "other").unwrap();

    // a request header with the same name replaces the default
    engine.assert(&TestCase::new(
        TestRequest::get("/health").header("authorization", "Bearer _token_"),
        TestResponse::status(200).raw_body("ok"),
    ));

    engine.set_default_headers(Default::default());
    let err = engine
        .test(&TestCase::new(
            TestRequest::get("/health"),
            TestResponse::status(200).raw_body("ok"),
        ))
        .unwrap_err();
    assert_eq!(err.failures().len(), 2);
    assert!(err
        .to_string()
        .starts_with("response code does not match. integers do not match. Expected 200, got 401\n"));
}

#[test]
fn test_missing_cat_reports_every_check() {
    let mut engine = engine();
    let err = engine
        .test(&TestCase::new(
            TestRequest::get("/api/cat/999"),
            TestResponse::status(200).body(Expected::partial([("name", Expected::regex("cat$"))])),
        ))
        .unwrap_err();

    let messages: Vec<String> = err.failures().iter().map(ToString::to_string).collect();
    assert_eq!(
        messages,
        [
            "response code does not match. integers do not match. Expected 200, got 404",
            "expected key name not found",
        ]
    );
}

#[test]
fn test_status_alternatives_and_negation() {
    let mut engine = engine();
    engine.assert(&TestCase::new(
        TestRequest::get("/nowhere"),
        TestResponse::code(Expected::and([Expected::not(200), Expected::or([404, 410])])),
    ));
}

#[test]
fn test_fail_fast_policy() {
    let mut engine = engine();
    engine.set_error_policy(ErrorPolicy::FailFast);
    let err = engine
        .test(&TestCase::new(
            TestRequest::post("/api/user").json(json!({"name": "Ann", "age": 30})),
            TestResponse::status(201).body(Expected::map([
                ("age", Expected::from(31)),
                ("id", Expected::from("u9")),
                ("name", Expected::from("Bob")),
                ("pets", Expected::ignore()),
            ])),
        ))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "map element [age] does not match. integers do not match. Expected 31, got 30"
    );
}

#[test]
fn test_yaml_marshaler_for_request() {
    init_tracing();
    let seen = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&seen);
    let transport = move |req: TransportRequest| -> Result<TransportResponse, TransportError> {
        *sink.lock().unwrap() = req.body;
        Ok(TransportResponse {
            status: 204,
            ..Default::default()
        })
    };
    let mut engine = Engine::new().with_transport(transport);
    engine.assert(&TestCase::new(
        TestRequest::put("/config").json(json!({"retries": 3})).marshaler(YamlCodec),
        TestResponse::status(204),
    ));
    let body = seen.lock().unwrap().clone().unwrap();
    assert_eq!(&body[..], b"retries: 3\n");
}

#[test]
fn test_engine_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    std::io::Write::write_all(
        &mut file,
        br#"
store_shortcut: { prefix: "<<", suffix: ">>" }
load_shortcut: { prefix: "{{", suffix: "}}" }
error_policy: fail_fast
default_headers:
  authorization: ["Bearer from-config"]
"#,
    )
    .unwrap();

    let config = EngineConfig::from_file(file.path()).unwrap();
    let mut engine = Engine::from_config(&config).unwrap();
    assert_eq!(engine.default_header("Authorization"), Some("Bearer from-config"));

    let store = Arc::new(Mutex::new(PetStore::default()));
    let service = tower::service_fn(move |req| handle(Arc::clone(&store), req));
    engine.set_transport(ServiceTransport::new(service));

    engine.assert(&TestCase::new(
        TestRequest::post("/api/cat").json(json!({"name": "Tom", "owner": "u1"})),
        TestResponse::status(201).body(Expected::partial([("id", "<<cat>>")])),
    ));
    engine.assert(&TestCase::new(
        TestRequest::get("/api/cat/{{cat}}"),
        TestResponse::status(200).body(Expected::partial([("name", "Tom")])),
    ));
}

#[test]
fn test_transport_failure_is_reported() {
    let transport = |_: TransportRequest| -> Result<TransportResponse, TransportError> {
        Err(TransportError::Service("connection refused".to_string()))
    };
    let mut engine = Engine::new().with_transport(transport);
    let err = engine
        .test(&TestCase::new(TestRequest::get("/"), TestResponse::status(200)))
        .unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
    assert_eq!(
        err.to_string(),
        "transport failed. service error: connection refused"
    );
}

#[test]
fn test_captured_id_is_substituted_into_next_path() {
    init_tracing();
    let paths = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&paths);
    let transport = move |req: TransportRequest| -> Result<TransportResponse, TransportError> {
        sink.lock().unwrap().push(req.path.clone());
        let body = match req.path.as_str() {
            "/api/user" => json!({
                "id": "55",
                "name": "John",
                "age": 51,
                "pets": [{"id": "123", "name": "Pepper the cat", "type": "cat"}],
                "weddingdate": "2019-06-22T16:00:10.123Z",
            }),
            _ => json!({"id": "123", "name": "Pepper the cat", "type": "cat"}),
        };
        Ok(TransportResponse {
            status: 200,
            body: Bytes::from(body.to_string()),
            ..Default::default()
        })
    };
    let mut engine = Engine::new().with_transport(transport);

    engine.assert(&TestCase::new(
        TestRequest::get("/api/user"),
        TestResponse::status(200).body(Expected::map([
            ("id", Expected::from("55")),
            ("name", Expected::from("John")),
            ("age", Expected::from(51)),
            (
                "pets",
                Expected::seq([Expected::map([
                    ("id", Expected::store("catid")),
                    ("name", Expected::from("Pepper the cat")),
                    ("type", Expected::from("cat")),
                ])]),
            ),
            ("weddingdate", Expected::from("2019-06-22T16:00:10.123Z")),
        ])),
    ));
    assert_eq!(engine.variable_string("catid"), "123");

    engine.assert(&TestCase::new(
        TestRequest::get("/api/cat/_catid_"),
        TestResponse::status(200).body(Expected::partial([("id", Expected::load("catid"))])),
    ));
    assert_eq!(*paths.lock().unwrap(), ["/api/user", "/api/cat/123"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_engine_inside_async_test() {
    let mut engine = engine();
    engine.assert(&TestCase::new(
        TestRequest::post("/api/cat").json(json!({"name": "Tom", "owner": "u1"})),
        TestResponse::status(201).body(Expected::partial([("id", "$cat$")])),
    ));
    engine.assert(&TestCase::new(
        TestRequest::get("/api/cat/_cat_"),
        TestResponse::status(200).body(Expected::partial([("name", "Tom")])),
    ));
}

#[tokio::test]
async fn test_engine_inside_current_thread_runtime_reports_error() {
    let mut engine = engine();
    let err = engine
        .test(&TestCase::new(TestRequest::get("/health"), TestResponse::status(200)))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "transport failed. service error: cannot drive the service from inside a current-thread runtime"
    );
}
