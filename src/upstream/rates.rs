// src/upstream/rates.rs
//! Latest-rates and pair-conversion client (exchangerate-api v6 wire format).

use anyhow::{bail, Result};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

use super::types::{RateFeed, RateSnapshot};
use super::{fetch_json, join_url, record_failure};
use crate::config::AppConfig;

#[derive(Debug, Deserialize)]
struct LatestResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default, rename = "error-type")]
    error_type: Option<String>,
    #[serde(default)]
    conversion_rates: Option<HashMap<String, f64>>,
}

#[derive(Debug, Deserialize)]
struct PairResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default, rename = "error-type")]
    error_type: Option<String>,
    #[serde(default)]
    conversion_result: Option<f64>,
}

fn check_result(what: &str, result: Option<&str>, error_type: Option<&str>) -> Result<()> {
    if result.is_some_and(|r| r.eq_ignore_ascii_case("error")) {
        bail!(
            "{what}: provider reported error ({})",
            error_type.unwrap_or("unknown")
        );
    }
    Ok(())
}

#[derive(Clone)]
pub struct RatesClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl RatesClient {
    pub fn new(http: Client, cfg: &AppConfig) -> Self {
        Self {
            http,
            base_url: cfg.upstream.rates_url.clone(),
            api_key: cfg.secrets.exchange_api_key.clone(),
        }
    }

    /// Full rate table for `base`. Errors on transport, non-2xx, bad JSON,
    /// or a provider-level error payload.
    pub async fn try_latest(&self, base: &str) -> Result<HashMap<String, f64>> {
        let url = join_url(&self.base_url, &[self.api_key.as_str(), "latest", base])?;
        let body: LatestResponse = fetch_json(self.http.get(url), "latest rates").await?;
        check_result(
            "latest rates",
            body.result.as_deref(),
            body.error_type.as_deref(),
        )?;
        match body.conversion_rates {
            Some(rates) => Ok(rates),
            None => bail!("latest rates: response has no conversion_rates"),
        }
    }

    /// Rates for exactly `codes`. Never fails: on any upstream problem every
    /// code maps to 0.
    pub async fn latest_rates(&self, base: &str, codes: &[String]) -> RateSnapshot {
        match self.try_latest(base).await {
            Ok(table) => RateSnapshot::from_rates(codes, |c| table.get(c).copied()),
            Err(e) => {
                record_failure("rates", &e);
                RateSnapshot::zeroed(codes)
            }
        }
    }

    /// `Ok(None)` when the provider answered without a conversion result.
    pub async fn try_convert(&self, amount: f64, from: &str, to: &str) -> Result<Option<f64>> {
        let amount_s = amount.to_string();
        let url = join_url(
            &self.base_url,
            &[self.api_key.as_str(), "pair", from, to, amount_s.as_str()],
        )?;
        let body: PairResponse = fetch_json(self.http.get(url), "pair conversion").await?;
        check_result(
            "pair conversion",
            body.result.as_deref(),
            body.error_type.as_deref(),
        )?;
        Ok(body.conversion_result)
    }

    pub async fn convert(&self, amount: f64, from: &str, to: &str) -> Option<f64> {
        match self.try_convert(amount, from, to).await {
            Ok(v) => v,
            Err(e) => {
                record_failure("convert", &e);
                None
            }
        }
    }
}

#[async_trait::async_trait]
impl RateFeed for RatesClient {
    async fn pair_rate(&self, base: &str, quote: &str) -> Result<f64> {
        let table = self.try_latest(base).await?;
        Ok(table.get(quote).copied().unwrap_or(0.0))
    }
}
