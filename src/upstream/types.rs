// src/upstream/types.rs
use anyhow::Result;
use chrono::NaiveDate;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Latest rates for a fixed set of codes, relative to one base code.
/// Keeps the requested order; missing codes are stored as 0.
#[derive(Debug, Clone, PartialEq)]
pub struct RateSnapshot {
    entries: Vec<(String, f64)>,
}

impl RateSnapshot {
    /// One entry per requested code; codes `lookup` misses become 0.
    pub fn from_rates<F>(codes: &[String], mut lookup: F) -> Self
    where
        F: FnMut(&str) -> Option<f64>,
    {
        let entries = codes
            .iter()
            .map(|c| (c.clone(), lookup(c).unwrap_or(0.0)))
            .collect();
        Self { entries }
    }

    pub fn zeroed(codes: &[String]) -> Self {
        Self::from_rates(codes, |_| None)
    }

    pub fn get(&self, code: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(c, _)| c == code)
            .map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(c, v)| (c.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// Serialized as a JSON object in requested order.
impl Serialize for RateSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (code, rate) in &self.entries {
            map.serialize_entry(code, rate)?;
        }
        map.end()
    }
}

/// One day of a pair's trend.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Headline {
    pub title: String,
    pub url: String,
    pub source: String,
}

/// Current rate of `quote` priced in `base`.
#[async_trait::async_trait]
pub trait RateFeed: Send + Sync {
    async fn pair_rate(&self, base: &str, quote: &str) -> Result<f64>;
}

/// Most recent headline title, or `None` when upstream has no articles.
#[async_trait::async_trait]
pub trait HeadlineFeed: Send + Sync {
    async fn latest_headline(&self) -> Result<Option<String>>;
}
