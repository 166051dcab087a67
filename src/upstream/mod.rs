// src/upstream/mod.rs
//! Thin clients over the third-party rate, time-series, and headline APIs.
//!
//! Every client exposes a fallible `try_*` call (used by the notification
//! loop, which needs to know a fetch failed) and a safe wrapper that logs and
//! returns the documented default so page rendering never fails on upstream
//! flakiness.

pub mod history;
pub mod news;
pub mod rates;
pub mod types;

use anyhow::{anyhow, Context, Result};
use metrics::counter;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use crate::config::AppConfig;

pub use history::HistoryClient;
pub use news::NewsClient;
pub use rates::RatesClient;
pub use types::{Headline, HeadlineFeed, HistoryPoint, RateFeed, RateSnapshot};

/// Shared HTTP client with explicit connect + request timeouts.
pub fn build_http_client(cfg: &AppConfig) -> Result<Client> {
    Client::builder()
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .connect_timeout(cfg.upstream.connect_timeout())
        .timeout(cfg.upstream.timeout())
        .build()
        .context("building upstream HTTP client")
}

/// Send, require 2xx, decode JSON. Each hop gets its own context.
pub(crate) async fn fetch_json<T: DeserializeOwned>(req: RequestBuilder, what: &str) -> Result<T> {
    let resp = req
        .send()
        .await
        .with_context(|| format!("{what}: request failed"))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(anyhow!("{what}: upstream returned HTTP {status}"));
    }
    resp.json::<T>()
        .await
        .with_context(|| format!("{what}: invalid JSON body"))
}

/// Log + count a swallowed upstream failure.
pub(crate) fn record_failure(client: &'static str, err: &anyhow::Error) {
    tracing::warn!(target: "upstream", client, error = %format!("{err:#}"), "upstream call failed; using fallback");
    counter!("upstream_errors_total", "client" => client).increment(1);
}

/// Append path segments to `base`. Each segment is percent-encoded, so
/// `/`, `?` and `#` in caller input cannot change the upstream path.
pub(crate) fn join_url(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url =
        Url::parse(base).with_context(|| format!("invalid upstream base URL {base:?}"))?;
    url.path_segments_mut()
        .map_err(|()| anyhow!("upstream base URL {base:?} cannot take path segments"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
