// tests/common/mod.rs
//
// Shared helpers: an in-process fake upstream (rates, time series, headlines)
// bound to an ephemeral port, and config pointing the clients at it.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use currency_pulse::config::AppConfig;
use currency_pulse::mail::{ContactMessage, Mailer};
use serde_json::{json, Value};
use std::collections::HashMap;

pub const API_KEY: &str = "test-key";

/// Closed port: connections are refused immediately.
pub const DEAD_UPSTREAM: &str = "http://127.0.0.1:1";

#[derive(Clone)]
pub struct FakeState {
    pub latest: Arc<Mutex<Value>>,
    pub latest_status: Arc<Mutex<StatusCode>>,
    pub pair_result: Arc<Mutex<Value>>,
    pub timeseries: Arc<Mutex<Value>>,
    pub news: Arc<Mutex<Value>>,
    pub hits: Arc<AtomicUsize>,
    pub last_query: Arc<Mutex<HashMap<String, String>>>,
    pub last_pair: Arc<Mutex<Option<(String, String)>>>,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            latest: Arc::new(Mutex::new(json!({
                "result": "success",
                "base_code": "USD",
                "conversion_rates": {
                    "USD": 1.0, "EUR": 0.92, "GBP": 0.79, "JPY": 149.5,
                    "CNY": 7.24, "GHS": 15.1, "NGN": 1530.0
                }
            }))),
            latest_status: Arc::new(Mutex::new(StatusCode::OK)),
            pair_result: Arc::new(Mutex::new(json!({
                "result": "success",
                "conversion_result": 92.5
            }))),
            timeseries: Arc::new(Mutex::new(json!({ "rates": {} }))),
            news: Arc::new(Mutex::new(articles(3))),
            hits: Arc::new(AtomicUsize::new(0)),
            last_query: Arc::new(Mutex::new(HashMap::new())),
            last_pair: Arc::new(Mutex::new(None)),
        }
    }
}

impl FakeState {
    pub fn set_latest(&self, v: Value) {
        *self.latest.lock().unwrap() = v;
    }
    pub fn set_latest_status(&self, s: StatusCode) {
        *self.latest_status.lock().unwrap() = s;
    }
    pub fn set_pair(&self, v: Value) {
        *self.pair_result.lock().unwrap() = v;
    }
    pub fn set_timeseries(&self, v: Value) {
        *self.timeseries.lock().unwrap() = v;
    }
    pub fn set_news(&self, v: Value) {
        *self.news.lock().unwrap() = v;
    }
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
    pub fn last_query(&self) -> HashMap<String, String> {
        self.last_query.lock().unwrap().clone()
    }
    /// Decoded `(from, to)` path segments of the last pair request.
    pub fn last_pair(&self) -> Option<(String, String)> {
        self.last_pair.lock().unwrap().clone()
    }
}

/// `n` articles titled "Headline 0" .. "Headline n-1".
pub fn articles(n: usize) -> Value {
    let items: Vec<Value> = (0..n)
        .map(|i| {
            json!({
                "source": { "id": null, "name": format!("Source {i}") },
                "title": format!("Headline {i}"),
                "url": format!("https://news.example.com/{i}")
            })
        })
        .collect();
    json!({ "status": "ok", "totalResults": n, "articles": items })
}

async fn latest(
    State(st): State<FakeState>,
    Path((key, _base)): Path<(String, String)>,
) -> Response {
    st.hits.fetch_add(1, Ordering::SeqCst);
    if key != API_KEY {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({"result": "error", "error-type": "invalid-key"})),
        )
            .into_response();
    }
    let status = *st.latest_status.lock().unwrap();
    let body = st.latest.lock().unwrap().clone();
    (status, Json(body)).into_response()
}

async fn pair(
    State(st): State<FakeState>,
    Path((_key, from, to, _amount)): Path<(String, String, String, String)>,
) -> Json<Value> {
    st.hits.fetch_add(1, Ordering::SeqCst);
    *st.last_pair.lock().unwrap() = Some((from, to));
    Json(st.pair_result.lock().unwrap().clone())
}

async fn timeseries(
    State(st): State<FakeState>,
    Query(q): Query<HashMap<String, String>>,
) -> Json<Value> {
    st.hits.fetch_add(1, Ordering::SeqCst);
    *st.last_query.lock().unwrap() = q;
    Json(st.timeseries.lock().unwrap().clone())
}

async fn news(
    State(st): State<FakeState>,
    Query(q): Query<HashMap<String, String>>,
) -> Json<Value> {
    st.hits.fetch_add(1, Ordering::SeqCst);
    *st.last_query.lock().unwrap() = q;
    Json(st.news.lock().unwrap().clone())
}

async fn not_json() -> &'static str {
    "<html>maintenance</html>"
}

/// Config whose every upstream answers 200 with an HTML body.
pub fn junk_config(base_url: &str) -> AppConfig {
    let mut cfg = config_for(base_url);
    cfg.upstream.rates_url = format!("{base_url}/junk");
    cfg.upstream.history_url = format!("{base_url}/junk");
    cfg.upstream.news_url = format!("{base_url}/junk");
    cfg
}

pub struct FakeUpstream {
    pub base_url: String,
    pub state: FakeState,
}

impl FakeUpstream {
    pub async fn start() -> Self {
        let state = FakeState::default();
        let app = Router::new()
            .route("/v6/{key}/latest/{base}", get(latest))
            .route("/v6/{key}/pair/{from}/{to}/{amount}", get(pair))
            .route("/timeseries", get(timeseries))
            .route("/news", get(news))
            .route("/junk", get(not_json))
            .route("/junk/{*rest}", get(not_json))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake upstream");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn config(&self) -> AppConfig {
        config_for(&self.base_url)
    }
}

pub fn config_for(base_url: &str) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.upstream.rates_url = format!("{base_url}/v6");
    cfg.upstream.history_url = format!("{base_url}/timeseries");
    cfg.upstream.news_url = format!("{base_url}/news");
    cfg.upstream.timeout_secs = 2;
    cfg.upstream.connect_timeout_secs = 1;
    cfg.secrets.exchange_api_key = API_KEY.to_string();
    cfg.secrets.currencyfreaks_api_key = API_KEY.to_string();
    cfg.secrets.news_api_key = API_KEY.to_string();
    cfg
}

/// Mailer that records messages instead of talking to a relay.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<ContactMessage>>,
    pub fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<ContactMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, msg: &ContactMessage) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("relay refused connection");
        }
        self.sent.lock().unwrap().push(msg.clone());
        Ok(())
    }
}
