// src/upstream/history.rs
//! Time-series client for a single currency pair, plus the gap-filling that
//! guarantees one point per calendar day.

use anyhow::{bail, Result};
use chrono::{Duration, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

use super::types::HistoryPoint;
use super::{fetch_json, record_failure};
use crate::config::AppConfig;

const DATE_FMT: &str = "%Y-%m-%d";

/// Longest trend window served, in days.
pub const MAX_WINDOW_DAYS: u32 = 366;

// --- tolerant response shapes ---

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RateValue {
    Num(f64),
    Text(String),
}

impl RateValue {
    fn as_f64(&self) -> Option<f64> {
        match self {
            RateValue::Num(v) => Some(*v),
            RateValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DatedRates {
    date: String,
    #[serde(default)]
    rates: HashMap<String, RateValue>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TimeseriesAny {
    /// `{"rates": {"2025-01-01": {"EUR": "0.91"}}}`
    ByDate {
        rates: HashMap<String, HashMap<String, RateValue>>,
    },
    /// `{"historicalRatesList": [{"date": "...", "rates": {...}}]}`
    List {
        #[serde(rename = "historicalRatesList")]
        historical_rates_list: Vec<DatedRates>,
    },
}

/// Extract `quote` per date. Unparseable dates or values are dropped, so the
/// fill step treats them as gaps.
fn quote_by_date(any: TimeseriesAny, quote: &str) -> HashMap<NaiveDate, f64> {
    let rows: Vec<(String, HashMap<String, RateValue>)> = match any {
        TimeseriesAny::ByDate { rates } => rates.into_iter().collect(),
        TimeseriesAny::List {
            historical_rates_list,
        } => historical_rates_list
            .into_iter()
            .map(|d| (d.date, d.rates))
            .collect(),
    };

    rows.into_iter()
        .filter_map(|(date, rates)| {
            // Some providers append a time component to the date key.
            let day = date.get(..10).unwrap_or(&date);
            let date = NaiveDate::parse_from_str(day, DATE_FMT).ok()?;
            let v = rates.get(quote)?.as_f64()?;
            Some((date, v))
        })
        .collect()
}

/// `days`-long window ending at `end` (inclusive on both sides). `days` is
/// clamped to `1..=MAX_WINDOW_DAYS` and the start never underflows the
/// calendar.
pub fn window_ending(end: NaiveDate, days: u32) -> (NaiveDate, NaiveDate) {
    let span = i64::from(days.clamp(1, MAX_WINDOW_DAYS)) - 1;
    let start = end
        .checked_sub_signed(Duration::days(span))
        .unwrap_or(NaiveDate::MIN);
    (start, end)
}

/// One point per calendar day in `[start, end]`. Missing days carry the last
/// known value forward; before any value is seen they are 0.
pub fn fill_series(
    start: NaiveDate,
    end: NaiveDate,
    known: &HashMap<NaiveDate, f64>,
) -> Vec<HistoryPoint> {
    let mut out = Vec::new();
    let mut last: Option<f64> = None;
    let mut day = start;
    while day <= end {
        if let Some(v) = known.get(&day) {
            last = Some(*v);
        }
        out.push(HistoryPoint {
            date: day,
            rate: last.unwrap_or(0.0),
        });
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    out
}

pub fn zero_series(start: NaiveDate, end: NaiveDate) -> Vec<HistoryPoint> {
    fill_series(start, end, &HashMap::new())
}

#[derive(Clone)]
pub struct HistoryClient {
    http: Client,
    url: String,
    api_key: String,
}

impl HistoryClient {
    pub fn new(http: Client, cfg: &AppConfig) -> Self {
        Self {
            http,
            url: cfg.upstream.history_url.clone(),
            api_key: cfg.secrets.currencyfreaks_api_key.clone(),
        }
    }

    /// Raw per-date values for `quote` in `base`, without gap filling.
    pub async fn try_fetch(
        &self,
        base: &str,
        quote: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HashMap<NaiveDate, f64>> {
        if start > end {
            bail!("history: start {start} is after end {end}");
        }
        let start_s = start.format(DATE_FMT).to_string();
        let end_s = end.format(DATE_FMT).to_string();
        let req = self.http.get(&self.url).query(&[
            ("apikey", self.api_key.as_str()),
            ("base", base),
            ("symbols", quote),
            ("start_date", start_s.as_str()),
            ("end_date", end_s.as_str()),
        ]);
        let body: TimeseriesAny = fetch_json(req, "history").await?;
        Ok(quote_by_date(body, quote))
    }

    /// Always exactly one point per day in `[start, end]`; all zeros when the
    /// upstream call fails.
    pub async fn history(
        &self,
        base: &str,
        quote: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<HistoryPoint> {
        match self.try_fetch(base, quote, start, end).await {
            Ok(known) => fill_series(start, end, &known),
            Err(e) => {
                record_failure("history", &e);
                zero_series(start, end)
            }
        }
    }
}
