use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        Form, State,
    },
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::{wrappers::ReceiverStream, Stream, StreamExt};
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};

use crate::config::AppConfig;
use crate::currencies::priority_codes;
use crate::mail::{build_mailer, send_contact, DynMailer, SendOutcome};
use crate::notify::{run_stream, NotificationEvent, StreamSettings};
use crate::pages::{self, ConverterView};
use crate::upstream::history::window_ending;
use crate::upstream::{
    build_http_client, Headline, HistoryClient, NewsClient, RateSnapshot, RatesClient,
};

pub const STATIC_DIR: &str = "static";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub rates: RatesClient,
    pub history: HistoryClient,
    pub news: NewsClient,
    pub mailer: DynMailer,
}

impl AppState {
    pub fn from_config(cfg: AppConfig) -> Result<Self> {
        let mailer = build_mailer(&cfg);
        Self::with_mailer(cfg, mailer)
    }

    pub fn with_mailer(cfg: AppConfig, mailer: DynMailer) -> Result<Self> {
        let http = build_http_client(&cfg)?;
        Ok(Self {
            rates: RatesClient::new(http.clone(), &cfg),
            history: HistoryClient::new(http.clone(), &cfg),
            news: NewsClient::new(http, &cfg),
            config: Arc::new(cfg),
            mailer,
        })
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(|| async { "ok" }))
        .route("/convert", get(converter_form).post(converter_submit))
        .route("/api/convert", post(api_convert))
        .route("/dashboard", get(dashboard))
        .route("/api/live-rates", get(api_live_rates))
        .route("/api/finance-news", get(api_finance_news))
        .route("/stream", get(stream))
        .route("/about", get(|| async { Html(pages::about_page()) }))
        .route("/settings", get(|| async { Html(pages::settings_page()) }))
        .route("/send_message", post(send_message))
        .route_service(
            "/service-worker.js",
            ServeFile::new(format!("{STATIC_DIR}/service-worker.js")),
        )
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn home() -> Html<String> {
    Html(pages::index_page())
}

// ---------------- converter ----------------

/// Amount as sent by clients: JSON number or decimal string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Number(f64),
    Text(String),
}

fn parse_amount(raw: &str) -> Result<f64, &'static str> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err("amount must be a decimal number"),
    }
}

impl AmountInput {
    fn value(&self) -> Result<f64, &'static str> {
        match self {
            AmountInput::Number(v) if v.is_finite() => Ok(*v),
            AmountInput::Number(_) => Err("amount must be a decimal number"),
            AmountInput::Text(s) => parse_amount(s),
        }
    }
}

fn required_code(v: Option<&str>, field: &'static str) -> Result<String, &'static str> {
    match v.map(str::trim) {
        Some(c) if !c.is_empty() => Ok(c.to_ascii_uppercase()),
        _ => Err(field),
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConvertForm {
    amount: Option<String>,
    from_currency: Option<String>,
    to_currency: Option<String>,
}

async fn converter_form() -> Html<String> {
    Html(pages::converter_page(&ConverterView::default()))
}

async fn converter_submit(
    State(state): State<AppState>,
    form: Result<Form<ConvertForm>, FormRejection>,
) -> Response {
    // A body that is not a form is treated like an empty submission.
    let form = form.map(|Form(f)| f).unwrap_or_default();
    let amount_raw = form.amount.as_deref().unwrap_or_default();
    let from_raw = form.from_currency.as_deref().unwrap_or("USD");
    let to_raw = form.to_currency.as_deref().unwrap_or("EUR");

    let parsed = parse_amount(amount_raw).and_then(|amount| {
        let from = required_code(form.from_currency.as_deref(), "from_currency is required")?;
        let to = required_code(form.to_currency.as_deref(), "to_currency is required")?;
        Ok((amount, from, to))
    });

    match parsed {
        Ok((amount, from, to)) => {
            let result = state.rates.convert(amount, &from, &to).await;
            let view = ConverterView {
                amount: amount_raw.trim(),
                from: &from,
                to: &to,
                result: Some(result),
                error: None,
            };
            Html(pages::converter_page(&view)).into_response()
        }
        Err(msg) => {
            let view = ConverterView {
                amount: amount_raw,
                from: from_raw,
                to: to_raw,
                result: None,
                error: Some(msg),
            };
            (StatusCode::BAD_REQUEST, Html(pages::converter_page(&view))).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ApiConvertReq {
    amount: Option<AmountInput>,
    from_currency: Option<String>,
    to_currency: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiConvertResp {
    pub result: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ApiError {
    error: String,
}

fn bad_request(msg: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError { error: msg.into() }),
    )
        .into_response()
}

async fn api_convert(
    State(state): State<AppState>,
    body: Result<Json<ApiConvertReq>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(b) => b,
        Err(rej) => return bad_request(rej.body_text()),
    };
    let amount = match req.amount.as_ref().map(AmountInput::value) {
        Some(Ok(v)) => v,
        Some(Err(msg)) => return bad_request(msg),
        None => return bad_request("amount is required"),
    };
    let from = match required_code(req.from_currency.as_deref(), "from_currency is required") {
        Ok(c) => c,
        Err(msg) => return bad_request(msg),
    };
    let to = match required_code(req.to_currency.as_deref(), "to_currency is required") {
        Ok(c) => c,
        Err(msg) => return bad_request(msg),
    };

    let result = state.rates.convert(amount, &from, &to).await;
    Json(ApiConvertResp { result }).into_response()
}

// ---------------- dashboard ----------------

async fn dashboard(State(state): State<AppState>) -> Html<String> {
    let cfg = &state.config.dashboard;
    let codes = priority_codes();
    let (start, end) = window_ending(chrono::Utc::now().date_naive(), cfg.history_days);

    let (rates, history) = tokio::join!(
        state.rates.latest_rates(&cfg.base, &codes),
        state.history.history(&cfg.base, &cfg.history_quote, start, end),
    );

    Html(pages::dashboard_page(
        &cfg.base,
        &rates,
        &cfg.history_quote,
        &history,
    ))
}

async fn api_live_rates(State(state): State<AppState>) -> Json<RateSnapshot> {
    let codes = priority_codes();
    Json(
        state
            .rates
            .latest_rates(&state.config.dashboard.base, &codes)
            .await,
    )
}

async fn api_finance_news(State(state): State<AppState>) -> Json<Vec<Headline>> {
    let news = &state.news;
    Json(
        news.top_headlines(
            news.default_category(),
            news.default_language(),
            state.config.news.limit,
        )
        .await,
    )
}

// ---------------- notification stream ----------------

fn to_sse(ev: NotificationEvent) -> Option<Result<Event, Infallible>> {
    match Event::default().json_data(&ev) {
        Ok(e) => Some(Ok(e)),
        Err(err) => {
            tracing::error!(target: "stream", error = %err, "failed to serialize stream event");
            None
        }
    }
}

/// One polling loop per connection. The loop owns the sender; dropping this
/// response (client gone) closes the channel and ends the loop.
async fn stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel::<NotificationEvent>(16);
    let settings = StreamSettings::from(&state.config.stream);

    tokio::spawn(run_stream(
        Arc::new(state.rates.clone()),
        Arc::new(state.news.clone()),
        settings,
        tx,
    ));

    let events = ReceiverStream::new(rx).filter_map(to_sse);
    Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(state.config.stream.keep_alive_secs.max(1)))
            .text("keep-alive"),
    )
}

// ---------------- contact ----------------

#[derive(Debug, Default, Deserialize)]
struct ContactForm {
    name: Option<String>,
    email: Option<String>,
    message: Option<String>,
}

async fn send_message(
    State(state): State<AppState>,
    form: Result<Form<ContactForm>, FormRejection>,
) -> (StatusCode, &'static str) {
    let form = match form {
        Ok(Form(f)) => f,
        Err(rej) => {
            tracing::debug!(
                target: "mail",
                error = %rej.body_text(),
                "contact form body not decodable"
            );
            ContactForm::default()
        }
    };
    let outcome = send_contact(
        state.mailer.as_ref(),
        form.name.as_deref(),
        form.email.as_deref(),
        form.message.as_deref(),
    )
    .await;

    match outcome {
        SendOutcome::Sent => (StatusCode::OK, "Message sent"),
        SendOutcome::MissingFields => (StatusCode::BAD_REQUEST, "Missing fields"),
        SendOutcome::Failed => (StatusCode::INTERNAL_SERVER_ERROR, "Failed to send message"),
    }
}
