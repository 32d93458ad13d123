//! Integration tests for the HTTP surface
//!
//! Each test builds the full router over the embedded knowledge tables and a
//! temp assets directory, then drives it request by request.

use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use futures::StreamExt;
use huggies::{app, AppState, KnowledgeBase};
use huggiesconf::HuggiesConfig;
use serde_json::{json, Value};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::timeout;
use tower::ServiceExt;

const SESSION_HEADER: &str = "mcp-session-id";

struct TestApp {
    state: AppState,
    router: Router,
    assets: TempDir,
}

fn test_app() -> TestApp {
    let assets = tempfile::tempdir().unwrap();
    let mut config = HuggiesConfig::default();
    config.widgets.assets_dir = assets.path().to_path_buf();

    let state = app::build_state(&config, KnowledgeBase::embedded().unwrap()).unwrap();
    TestApp {
        router: app::router(state.clone()),
        state,
        assets,
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, headers, body)
}

fn mcp_post(session: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/mcp")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(id) = session {
        builder = builder.header(SESSION_HEADER, id);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn initialize_request(id: u64) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "initialize",
        "params": {
            "protocolVersion": "2025-03-26",
            "capabilities": {},
            "clientInfo": { "name": "integration-test", "version": "0.0.1" }
        }
    })
}

fn call_request(id: u64, tool: &str, arguments: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": { "name": tool, "arguments": arguments }
    })
}

/// Initialize a streamable session and return its id.
async fn open_session(router: &Router) -> String {
    let (status, headers, body) = send(router, mcp_post(None, initialize_request(1))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["serverInfo"]["name"], "huggies");
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .expect("initialize returns a session header")
}

#[tokio::test]
async fn test_initialize_opens_session() {
    let app = test_app();
    let session = open_session(&app.router).await;
    assert!(!session.is_empty());

    let notification = json!({ "jsonrpc": "2.0", "method": "notifications/initialized" });
    let (status, headers, _) = send(&app.router, mcp_post(Some(&session), notification)).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(
        headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok()),
        Some(session.as_str())
    );
}

#[tokio::test]
async fn test_tools_list_in_registration_order() {
    let app = test_app();
    let session = open_session(&app.router).await;

    let request = json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" });
    let (status, _, body) = send(&app.router, mcp_post(Some(&session), request)).await;
    assert_eq!(status, StatusCode::OK);

    let tools = body["result"]["tools"].as_array().unwrap();
    let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert_eq!(
        names,
        vec![
            "get_faq",
            "list_faqs",
            "get_item_by_id",
            "diaper_size_calc",
            "map_widget",
            "coupons",
            "suggest_names",
            "predict_gender",
        ]
    );
    assert_eq!(
        tools[0]["_meta"]["openai/outputTemplate"],
        "ui://widget/huggies-cards.html"
    );
    assert_eq!(tools[0]["_meta"]["openai/widgetAccessible"], true);
    assert_eq!(tools[0]["inputSchema"]["type"], "object");
}

#[tokio::test]
async fn test_get_faq_result_carries_widget() {
    let app = test_app();
    let session = open_session(&app.router).await;

    let request = call_request(3, "get_faq", json!({ "query": "leaks" }));
    let (status, _, body) = send(&app.router, mcp_post(Some(&session), request)).await;
    assert_eq!(status, StatusCode::OK);

    let result = &body["result"];
    assert!(!result["structuredContent"]["results"].as_array().unwrap().is_empty());
    assert_eq!(result["content"][0]["type"], "text");

    let meta = &result["_meta"];
    assert_eq!(meta["openai/outputTemplate"], "ui://widget/huggies-cards.html");
    assert_eq!(meta["openai/toolInvocation/invoking"], "Searching FAQs");
    assert_eq!(meta["widget"]["templateId"], "huggies-cards");
    assert_eq!(meta["widget"]["url"], "http://localhost:8000/assets/huggies-cards.html");
    assert_eq!(meta["widget"]["origin"], "static");
}

#[tokio::test]
async fn test_diaper_size_call() {
    let app = test_app();
    let session = open_session(&app.router).await;

    let request = call_request(4, "diaper_size_calc", json!({ "weight_lb": 16 }));
    let (status, _, body) = send(&app.router, mcp_post(Some(&session), request)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["structuredContent"]["backend"]["recommended_size"], "2");
}

#[tokio::test]
async fn test_every_tool_output_satisfies_its_schema() {
    let app = test_app();
    let session = open_session(&app.router).await;

    let cases = [
        ("get_faq", json!({ "query": "leaks", "limit": 2 })),
        ("get_faq", json!({ "query": "   " })),
        ("get_faq", json!({ "query": "zzz-no-such-topic" })),
        ("list_faqs", json!({})),
        ("get_item_by_id", json!({ "item_id": "faq-001" })),
        ("diaper_size_calc", json!({ "weight_kg": 4.2 })),
        ("diaper_size_calc", json!({ "weight_lb": 60 })),
        ("map_widget", json!({})),
        ("map_widget", json!({ "limit": 50 })),
        ("map_widget", json!({ "location": "nowhere-at-all" })),
        ("coupons", json!({})),
        ("suggest_names", json!({})),
        ("suggest_names", json!({ "prefix": "A", "count": 0 })),
        ("predict_gender", json!({ "due_date": "2026-03-15" })),
        ("predict_gender", json!({ "conception_date": "2026-01-01" })),
    ];

    for (i, (tool, arguments)) in cases.iter().enumerate() {
        let request = call_request(100 + i as u64, tool, arguments.clone());
        let (status, _, body) = send(&app.router, mcp_post(Some(&session), request)).await;
        assert_eq!(status, StatusCode::OK, "{} {}", tool, arguments);
        assert!(
            body.get("error").is_none(),
            "{} {} failed: {}",
            tool,
            arguments,
            body["error"]
        );
        let result = &body["result"];
        assert!(
            result["structuredContent"].is_object(),
            "{} {} has no structured content",
            tool,
            arguments
        );
        assert!(result["structuredContent"]["text"].is_string());
        assert!(result["_meta"]["widget"].is_object(), "{} has no widget", tool);
    }
}

#[tokio::test]
async fn test_missing_session_header_rejected() {
    let app = test_app();
    let request = json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/list" });
    let (status, _, body) = send(&app.router, mcp_post(None, request)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_object());
}

#[tokio::test]
async fn test_unknown_session_is_404() {
    let app = test_app();
    let request = json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/list" });
    let (status, _, body) = send(&app.router, mcp_post(Some("no-such-session"), request)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["data"]["kind"], "unknown_session");
}

#[tokio::test]
async fn test_unknown_argument_is_invalid_argument() {
    let app = test_app();
    let session = open_session(&app.router).await;

    let request = call_request(5, "get_faq", json!({ "query": "leaks", "verbose": true }));
    let (status, _, body) = send(&app.router, mcp_post(Some(&session), request)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"]["code"], -32602);
    assert_eq!(body["error"]["data"]["kind"], "invalid_argument");
}

#[tokio::test]
async fn test_unknown_tool_is_method_not_found() {
    let app = test_app();
    let session = open_session(&app.router).await;

    let request = call_request(6, "order_diapers", json!({}));
    let (_, _, body) = send(&app.router, mcp_post(Some(&session), request)).await;
    assert_eq!(body["error"]["code"], -32601);
    assert_eq!(body["error"]["data"]["kind"], "unknown_tool");
}

#[tokio::test]
async fn test_unknown_item_is_not_found() {
    let app = test_app();
    let session = open_session(&app.router).await;

    let request = call_request(7, "get_item_by_id", json!({ "item_id": "faq-999" }));
    let (_, _, body) = send(&app.router, mcp_post(Some(&session), request)).await;
    assert_eq!(body["error"]["code"], -32002);
    assert_eq!(body["error"]["data"]["kind"], "not_found");
}

#[tokio::test]
async fn test_resources_read_widget() {
    let app = test_app();
    let session = open_session(&app.router).await;

    let request = json!({
        "jsonrpc": "2.0",
        "id": 8,
        "method": "resources/read",
        "params": { "uri": "ui://widget/huggies-map.html" }
    });
    let (status, _, body) = send(&app.router, mcp_post(Some(&session), request)).await;
    assert_eq!(status, StatusCode::OK);

    let contents = &body["result"]["contents"][0];
    assert_eq!(contents["uri"], "ui://widget/huggies-map.html");
    assert_eq!(contents["mimeType"], "text/html+skybridge");
    assert!(contents["text"].as_str().unwrap().contains("huggies-map-root"));
}

#[tokio::test]
async fn test_resources_read_unknown_uri() {
    let app = test_app();
    let session = open_session(&app.router).await;

    let request = json!({
        "jsonrpc": "2.0",
        "id": 9,
        "method": "resources/read",
        "params": { "uri": "ui://widget/huggies-nope.html" }
    });
    let (_, _, body) = send(&app.router, mcp_post(Some(&session), request)).await;
    assert_eq!(body["error"]["code"], -32002);
    assert_eq!(body["error"]["data"]["kind"], "widget_not_found");
}

#[tokio::test]
async fn test_delete_session_is_idempotent() {
    let app = test_app();
    let session = open_session(&app.router).await;

    let delete = || {
        Request::builder()
            .method(Method::DELETE)
            .uri("/mcp")
            .header(SESSION_HEADER, session.as_str())
            .body(Body::empty())
            .unwrap()
    };
    let (first, _, _) = send(&app.router, delete()).await;
    let (second, _, _) = send(&app.router, delete()).await;
    assert_eq!(first, StatusCode::NO_CONTENT);
    assert_eq!(second, StatusCode::NO_CONTENT);

    let request = json!({ "jsonrpc": "2.0", "id": 10, "method": "tools/list" });
    let (status, _, _) = send(&app.router, mcp_post(Some(&session), request)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_asset_routes() {
    let app = test_app();
    std::fs::write(app.assets.path().join("app.js"), "console.log('hi');").unwrap();

    let response = app.router.clone().oneshot(get("/assets/huggies-cards.html")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/html; charset=utf-8"
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("huggies-cards-root"));

    let response = app.router.clone().oneshot(get("/assets/app.js")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/javascript");

    let response = app.router.clone().oneshot(get("/assets/missing.js")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bundle_markup_preferred_over_shell() {
    let app = test_app();
    std::fs::write(
        app.assets.path().join("huggies-offers.html"),
        "<div id=\"built-offers\"></div>",
    )
    .unwrap();

    let response = app.router.clone().oneshot(get("/assets/huggies-offers.html")).await.unwrap();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("built-offers"));
}

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let (status, _, body) = send(&app.router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["tools"], 8);
}

#[tokio::test]
async fn test_legacy_message_unknown_session() {
    let app = test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/mcp/message?sessionId=bogus")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(initialize_request(1).to_string()))
        .unwrap();
    let (status, _, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["data"]["kind"], "unknown_session");
}

/// Read SSE frames until one contains `needle`.
async fn read_until<S>(stream: &mut S, buffer: &mut String, needle: &str) -> String
where
    S: futures::Stream<Item = Result<axum::body::Bytes, axum::Error>> + Unpin,
{
    loop {
        if let Some(end) = buffer.find("\n\n") {
            let frame: String = buffer.drain(..end + 2).collect();
            if frame.contains(needle) {
                return frame;
            }
            continue;
        }
        let chunk = timeout(Duration::from_secs(5), stream.next())
            .await
            .expect("timed out waiting for SSE frame")
            .expect("SSE stream ended")
            .unwrap();
        buffer.push_str(&String::from_utf8_lossy(&chunk));
    }
}

#[tokio::test]
async fn test_legacy_sse_flow() {
    let app = test_app();

    let response = app.router.clone().oneshot(get("/mcp/sse")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let mut stream = response.into_body().into_data_stream();
    let mut buffer = String::new();

    let endpoint = read_until(&mut stream, &mut buffer, "event: endpoint").await;
    let data = endpoint
        .lines()
        .find_map(|line| line.strip_prefix("data: "))
        .unwrap()
        .trim()
        .to_string();
    assert!(data.starts_with("/mcp/message?sessionId="));

    let request = Request::builder()
        .method(Method::POST)
        .uri(data.as_str())
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(initialize_request(1).to_string()))
        .unwrap();
    let (status, _, _) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let message = read_until(&mut stream, &mut buffer, "event: message").await;
    assert!(message.contains("serverInfo"));
    assert!(message.contains("huggies"));
}

#[tokio::test]
async fn test_closing_all_sessions_ends_sse_stream() {
    let app = test_app();

    let response = app.router.clone().oneshot(get("/mcp/sse")).await.unwrap();
    let mut stream = response.into_body().into_data_stream();
    let mut buffer = String::new();
    read_until(&mut stream, &mut buffer, "event: endpoint").await;

    assert_eq!(app.state.sessions().close_all(), 1);

    let ended = timeout(Duration::from_secs(5), async {
        while let Some(chunk) = stream.next().await {
            chunk.unwrap();
        }
    })
    .await;
    assert!(ended.is_ok(), "SSE stream still open after close_all");
}
