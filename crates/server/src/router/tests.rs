use std::sync::Arc;

use apiloom_core::config::{ExecutionConfig, IngestConfig, RegistryConfig, Web3Config};
use apiloom_core::Config;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::routing::get;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::build_router;
use crate::state::AppState;

const DIRECTORY: &str = r#"{"count":2,"entries":[
    {"API":"Brand New API","Description":"Fresh from the directory","Auth":"","HTTPS":true,"Cors":"yes","Link":"https://brand-new.example.com/","Category":"Development"},
    {"API":"Dog CEO","Description":"Dogs","Auth":"","HTTPS":true,"Cors":"yes","Link":"https://dog.ceo/dog-api/","Category":"Animals"}
]}"#;

fn test_config(remote_url: &str) -> Config {
    let mut config = Config::for_profile("");
    config.server.cors_origin = "*".to_string();
    config.ingest = IngestConfig {
        remote_directory_url: remote_url.to_string(),
        refresh_interval_secs: 0,
        fetch_timeout_ms: 2_000,
        ..IngestConfig::default()
    };
    config.execution = ExecutionConfig {
        request_timeout_ms: 2_000,
        flow_deadline_ms: 5_000,
        ..ExecutionConfig::default()
    };
    config.registry = RegistryConfig::default();
    config.web3 = Web3Config::default();
    config
}

fn app_with(remote_url: &str) -> Router {
    let state = AppState::from_config(test_config(remote_url)).unwrap();
    build_router(Arc::new(state))
}

fn app() -> Router {
    app_with("http://127.0.0.1:9/unreachable.json")
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            builder = builder.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn initialized() -> Router {
    let app = app();
    let (status, _) = send(&app, Method::POST, "/init", None).await;
    assert_eq!(status, StatusCode::OK);
    app
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

// ── Lifecycle ────────────────────────────────────────────────────

#[tokio::test]
async fn health_is_always_ok() {
    let (status, body) = send(&app(), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn init_is_idempotent_and_flips_status() {
    let app = app();
    let (_, before) = send(&app, Method::GET, "/status", None).await;
    assert_eq!(before["initialized"], false);
    assert_eq!(before["stats"]["totalApis"], 0);

    let (_, first) = send(&app, Method::POST, "/init", None).await;
    assert_eq!(first["cached"], false);
    assert!(first["ingest"]["totalApis"].as_u64().unwrap() > 0);
    assert!(first["flowsGenerated"].as_u64().unwrap() > 0);

    let (_, second) = send(&app, Method::POST, "/init", None).await;
    assert_eq!(second["cached"], true);
    assert_eq!(second["ingest"]["totalApis"], first["ingest"]["totalApis"]);

    let (_, after) = send(&app, Method::GET, "/status", None).await;
    assert_eq!(after["initialized"], true);
    assert_eq!(after["capabilityRegistry"], "in-memory");
    assert!(after["endpointCount"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn refresh_reports_net_new_apis() {
    let base = serve(Router::new().route("/dir.json", get(|| async { DIRECTORY }))).await;
    let app = app_with(&format!("{base}/dir.json"));
    send(&app, Method::POST, "/init", None).await;

    let (status, body) = send(&app, Method::POST, "/refresh", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["newApis"], 1);

    let (_, found) = send(&app, Method::GET, "/apis/search?q=brand%20new", None).await;
    assert_eq!(found["count"], 1);
}

#[tokio::test]
async fn refresh_surfaces_fetch_errors() {
    let app = app();
    let (status, body) = send(&app, Method::POST, "/refresh", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(!body["result"]["errors"].as_array().unwrap().is_empty());

    let (_, sources) = send(&app, Method::GET, "/sources", None).await;
    let remote = sources["sources"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["id"] == "public-apis")
        .cloned()
        .unwrap();
    assert_eq!(remote["status"], "error");
}

// ── Catalog ──────────────────────────────────────────────────────

#[tokio::test]
async fn search_requires_query() {
    let app = initialized().await;
    let (status, body) = send(&app, Method::GET, "/apis/search", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("q"));

    let (status, body) = send(&app, Method::GET, "/apis/search?q=dog", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["count"].as_u64().unwrap() >= 1);

    let (_, animals) = send(&app, Method::GET, "/apis/category/ANIMALS", None).await;
    assert!(animals["count"].as_u64().unwrap() >= 2);
}

#[tokio::test]
async fn admin_delete_removes_endpoints() {
    let app = initialized().await;
    let (status, _) = send(&app, Method::GET, "/endpoints/public.dog_ceo.random", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::DELETE, "/apis/Dog%20CEO", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], "Dog CEO");

    let (status, _) = send(&app, Method::GET, "/endpoints/public.dog_ceo.random", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::DELETE, "/apis/Dog%20CEO", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, flows) = send(&app, Method::GET, "/flows", None).await;
    for flow in flows["flows"].as_array().unwrap() {
        for step in flow["steps"].as_array().unwrap() {
            assert!(!step["endpointKey"].as_str().unwrap().contains("dog_ceo"));
        }
    }
}

#[tokio::test]
async fn clear_allows_reinitialization() {
    let app = initialized().await;
    let (_, cleared) = send(&app, Method::DELETE, "/apis", None).await;
    assert!(cleared["removed"].as_u64().unwrap() > 0);

    let (_, status) = send(&app, Method::GET, "/status", None).await;
    assert_eq!(status["initialized"], false);
    assert_eq!(status["stats"]["totalApis"], 0);

    let (_, again) = send(&app, Method::POST, "/init", None).await;
    assert_eq!(again["cached"], false);
    assert!(again["ingest"]["totalApis"].as_u64().unwrap() > 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn clear_racing_init_leaves_consistent_state() {
    for _ in 0..10 {
        let app = app();
        let (init, clear) = tokio::join!(
            send(&app, Method::POST, "/init", None),
            send(&app, Method::DELETE, "/apis", None),
        );
        assert_eq!(init.0, StatusCode::OK);
        assert_eq!(clear.0, StatusCode::OK);

        let (_, status) = send(&app, Method::GET, "/status", None).await;
        let has_apis = status["stats"]["totalApis"].as_u64().unwrap() > 0;
        assert_eq!(status["initialized"], has_apis, "{status}");
    }
}

// ── Endpoints & flows ────────────────────────────────────────────

#[tokio::test]
async fn endpoint_lookup_includes_description() {
    let app = initialized().await;
    let (status, body) = send(&app, Method::GET, "/endpoints/public.dog_ceo.random", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["endpoint"]["apiName"], "Dog CEO");
    assert!(body["description"].as_str().unwrap().contains("Dog CEO"));

    let (status, body) = send(&app, Method::GET, "/endpoints/public.nope.nothing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("public.nope.nothing"));
}

#[tokio::test]
async fn flow_lookup_and_category_flows() {
    let app = initialized().await;
    let (_, list) = send(&app, Method::GET, "/flows", None).await;
    let id = list["flows"][0]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::GET, &format!("/flows/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["description"].as_str().unwrap().contains("1."));

    let (status, _) = send(&app, Method::GET, "/flows/does-not-exist", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::POST, "/flows/category", Some(json!({ "categories": [] }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::POST,
        "/flows/category",
        Some(json!({ "categories": ["Animals", "Entertainment"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["flow"]["provenance"], "manual");
    assert_eq!(body["flow"]["steps"].as_array().unwrap().len(), 2);
}

// ── Execution ────────────────────────────────────────────────────

#[tokio::test]
async fn execute_validates_requests() {
    let app = initialized().await;
    let (status, _) = send(&app, Method::POST, "/execute", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, Method::POST, "/execute", Some(json!({ "key": "public.nope.nothing" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["errorKind"], "unknownEndpoint");

    let (status, body) = send(&app, Method::POST, "/execute", Some(json!({ "key": "public.dog_ceo.by_breed" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorKind"], "missingParameters");
    assert!(body["error"].as_str().unwrap().contains("breed"));
}

#[tokio::test]
async fn flow_validates_requests() {
    let app = initialized().await;
    let (status, _) = send(&app, Method::POST, "/flow", Some(json!({ "parallel": true }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, Method::POST, "/flow", Some(json!({ "flowId": "no-such-flow" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["errorKind"], "unknownFlow");
}

// ── Chain data ───────────────────────────────────────────────────

#[tokio::test]
async fn web3_without_keys_reports_missing_credentials() {
    let app = app();
    let (_, status) = send(&app, Method::GET, "/web3/status", None).await;
    assert_eq!(status["providers"].as_array().unwrap().len(), 3);
    assert!(status["providers"]
        .as_array()
        .unwrap()
        .iter()
        .all(|p| p["configured"] == false));

    let (status, body) = send(
        &app,
        Method::POST,
        "/web3/execute",
        Some(json!({ "key": "web3.moralis.wallet_balance", "params": { "address": "0x123" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["provider"], "moralis");
    assert_eq!(body["errorKind"], "missingCredential");
    assert!(body["error"].as_str().unwrap().contains("API key"));
}

#[tokio::test]
async fn web3_flow_requires_address() {
    let app = app();
    let (status, body) = send(&app, Method::POST, "/web3/flow", Some(json!({ "flowId": "wallet-overview" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("address"));

    let (status, body) = send(
        &app,
        Method::POST,
        "/web3/flow",
        Some(json!({ "flowId": "wallet-overview", "address": "0x123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["parallel"], true);
    assert_eq!(body["succeededSteps"], 0);

    let (status, _) = send(&app, Method::GET, "/web3/flows/wallet-overview", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::GET, "/web3/flows/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
