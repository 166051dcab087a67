// src/notify/mod.rs
//! Live notification stream: per-connection change detection over polled
//! rate and headline feeds.

pub mod state;
pub mod stream;

use serde::{Deserialize, Serialize};

pub use state::NotificationState;
pub use stream::{run_stream, tick, StreamSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Rate,
    News,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Rate => "rate",
            EventKind::News => "news",
        }
    }
}

/// Wire shape of one stream event: `{"type": "rate"|"news", "message": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub message: String,
}

impl NotificationEvent {
    pub fn rate(base: &str, quote: &str, rate: f64) -> Self {
        Self {
            kind: EventKind::Rate,
            message: format!("{base}→{quote} now {rate}"),
        }
    }

    pub fn news(headline: &str) -> Self {
        Self {
            kind: EventKind::News,
            message: headline.to_string(),
        }
    }
}
