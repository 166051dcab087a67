// tests/api_http.rs
//
// HTTP-level tests for the public Router without opening app sockets.
// Upstreams are served by the in-process fake from `common`.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{self, Body},
    http::{header, Request, StatusCode},
    Router,
};
use common::{articles, FakeUpstream, RecordingMailer};
use currency_pulse::{create_router, AppConfig, AppState};
use serde_json::{json, Value as Json};
use tokio_stream::StreamExt as _;
use tower::ServiceExt as _; // for `oneshot`

const BODY_LIMIT: usize = 1024 * 1024;

fn router_for(cfg: AppConfig) -> Router {
    let state = AppState::with_mailer(cfg, Arc::new(RecordingMailer::default()))
        .expect("app state");
    create_router(state)
}

async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build GET");
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    (status, String::from_utf8(bytes.to_vec()).expect("utf8"))
}

async fn post_json(app: Router, uri: &str, payload: Json) -> (StatusCode, Json) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build POST");
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    (status, serde_json::from_slice(&bytes).expect("json body"))
}

async fn post_form(app: Router, uri: &str, form: &str) -> (StatusCode, String) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .expect("build POST form");
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    (status, String::from_utf8(bytes.to_vec()).expect("utf8"))
}

#[tokio::test]
async fn health_returns_ok() {
    let up = FakeUpstream::start().await;
    let (status, body) = get(router_for(up.config()), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn api_convert_returns_upstream_result() {
    let up = FakeUpstream::start().await;
    let (status, v) = post_json(
        router_for(up.config()),
        "/api/convert",
        json!({"amount": 100, "from_currency": "USD", "to_currency": "EUR"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v, json!({"result": 92.5}));
}

#[tokio::test]
async fn api_convert_accepts_amount_as_string() {
    let up = FakeUpstream::start().await;
    let (status, v) = post_json(
        router_for(up.config()),
        "/api/convert",
        json!({"amount": "100", "from_currency": "usd", "to_currency": "eur"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["result"], json!(92.5));
}

#[tokio::test]
async fn api_convert_null_when_upstream_fails() {
    let app = router_for(common::config_for(common::DEAD_UPSTREAM));
    let (status, v) = post_json(
        app,
        "/api/convert",
        json!({"amount": 1, "from_currency": "USD", "to_currency": "EUR"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v, json!({"result": null}));
}

#[tokio::test]
async fn api_convert_rejects_bad_input_before_calling_upstream() {
    let up = FakeUpstream::start().await;
    for payload in [
        json!({"amount": "ten", "from_currency": "USD", "to_currency": "EUR"}),
        json!({"from_currency": "USD", "to_currency": "EUR"}),
        json!({"amount": 5, "from_currency": "", "to_currency": "EUR"}),
        json!({"amount": 5, "from_currency": "USD"}),
    ] {
        let (status, v) = post_json(router_for(up.config()), "/api/convert", payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(v.get("error").is_some());
    }
    assert_eq!(up.state.hits(), 0);
}

#[tokio::test]
async fn live_rates_lists_priority_codes() {
    let up = FakeUpstream::start().await;
    let (status, body) = get(router_for(up.config()), "/api/live-rates").await;
    assert_eq!(status, StatusCode::OK);
    let v: Json = serde_json::from_str(&body).unwrap();
    let obj = v.as_object().expect("object");
    let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["AUD", "CNY", "EUR", "GBP", "GHS", "JPY", "NGN", "USD"]);
    assert_eq!(v["EUR"], json!(0.92));
    assert_eq!(v["AUD"], json!(0.0));
}

#[tokio::test]
async fn finance_news_caps_at_ten_preserving_order() {
    let up = FakeUpstream::start().await;
    up.state.set_news(articles(15));
    let (status, body) = get(router_for(up.config()), "/api/finance-news").await;
    assert_eq!(status, StatusCode::OK);
    let v: Json = serde_json::from_str(&body).unwrap();
    let arr = v.as_array().expect("array");
    assert_eq!(arr.len(), 10);
    for (i, item) in arr.iter().enumerate() {
        assert_eq!(
            item,
            &json!({
                "title": format!("Headline {i}"),
                "url": format!("https://news.example.com/{i}"),
                "source": format!("Source {i}")
            })
        );
    }
}

#[tokio::test]
async fn finance_news_empty_on_failure() {
    let app = router_for(common::config_for(common::DEAD_UPSTREAM));
    let (status, body) = get(app, "/api/finance-news").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
}

#[tokio::test]
async fn dashboard_renders_rates_and_seven_day_trend() {
    let up = FakeUpstream::start().await;
    let (status, html) = get(router_for(up.config()), "/dashboard").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Ghanaian Cedi"));
    assert!(html.contains("class=\"trend-chart\""));
    assert_eq!(html.matches("<tr><td>20").count(), 7, "one trend row per day");
}

#[tokio::test]
async fn dashboard_still_renders_when_upstreams_are_down() {
    let app = router_for(common::config_for(common::DEAD_UPSTREAM));
    let (status, html) = get(app, "/dashboard").await;
    assert_eq!(status, StatusCode::OK);
    // All-zero fallback series draws as a flat line across the chart.
    assert!(html.contains("points=\"4.0,50.0 "));
    assert!(html.contains(" 296.0,50.0\""));
}

#[tokio::test]
async fn converter_form_and_submit() {
    let up = FakeUpstream::start().await;
    let (status, html) = get(router_for(up.config()), "/convert").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("name=\"from_currency\""));

    let (status, html) = post_form(
        router_for(up.config()),
        "/convert",
        "amount=100&from_currency=USD&to_currency=EUR",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<strong>92.5</strong>"));

    let (status, html) = post_form(
        router_for(up.config()),
        "/convert",
        "amount=abc&from_currency=USD&to_currency=EUR",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(html.contains("class=\"error\""));
}

#[tokio::test]
async fn converter_without_form_body_rerenders_with_error() {
    let up = FakeUpstream::start().await;
    let req = Request::builder()
        .method("POST")
        .uri("/convert")
        .body(Body::empty())
        .unwrap();
    let resp = router_for(up.config()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("class=\"error\""));
    assert!(html.contains("name=\"from_currency\""));
}

#[tokio::test]
async fn static_pages_and_service_worker() {
    let up = FakeUpstream::start().await;
    for uri in ["/", "/about", "/settings"] {
        let (status, html) = get(router_for(up.config()), uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert!(html.starts_with("<!doctype html>"), "{uri}");
    }

    let req = Request::builder()
        .uri("/service-worker.js")
        .body(Body::empty())
        .unwrap();
    let resp = router_for(up.config()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let ct = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(ct.contains("javascript"), "content-type was {ct}");
}

#[tokio::test]
async fn stream_pushes_rate_and_news_events() {
    let up = FakeUpstream::start().await;
    let req = Request::builder()
        .uri("/stream")
        .body(Body::empty())
        .unwrap();
    let resp = router_for(up.config()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let ct = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(ct.starts_with("text/event-stream"), "content-type was {ct}");

    let mut frames = resp.into_body().into_data_stream();
    let mut text = String::new();
    while !(text.contains("\"type\":\"rate\"") && text.contains("\"type\":\"news\"")) {
        let chunk = tokio::time::timeout(Duration::from_secs(3), frames.next())
            .await
            .expect("stream frame within 3s")
            .expect("stream still open")
            .expect("frame ok");
        text.push_str(std::str::from_utf8(&chunk).expect("utf8 frame"));
    }
    assert!(text.contains(r#"data: {"type":"rate","message":"USD→GHS now 15.1"}"#));
    assert!(text.contains(r#"data: {"type":"news","message":"Headline 0"}"#));
}
