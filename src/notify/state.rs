// src/notify/state.rs
use super::NotificationEvent;

/// Last values seen by one open stream. Starts empty for every connection.
///
/// Rate changes are compared against `rate_epsilon`: 0.0 means exact float
/// equality, so upstream jitter in the last digit does produce events.
#[derive(Debug, Clone, Default)]
pub struct NotificationState {
    last_rate: Option<f64>,
    last_headline: Option<String>,
    rate_epsilon: f64,
}

impl NotificationState {
    pub fn new(rate_epsilon: f64) -> Self {
        Self {
            rate_epsilon: if rate_epsilon.is_finite() {
                rate_epsilon.max(0.0)
            } else {
                0.0
            },
            ..Self::default()
        }
    }

    /// Record `rate` and return an event if it differs from the last one.
    pub fn observe_rate(
        &mut self,
        base: &str,
        quote: &str,
        rate: f64,
    ) -> Option<NotificationEvent> {
        let changed = match self.last_rate {
            None => true,
            Some(prev) if self.rate_epsilon == 0.0 => prev != rate,
            Some(prev) => (prev - rate).abs() > self.rate_epsilon,
        };
        if !changed {
            return None;
        }
        self.last_rate = Some(rate);
        Some(NotificationEvent::rate(base, quote, rate))
    }

    pub fn observe_headline(&mut self, headline: &str) -> Option<NotificationEvent> {
        if self.last_headline.as_deref() == Some(headline) {
            return None;
        }
        self.last_headline = Some(headline.to_string());
        Some(NotificationEvent::news(headline))
    }

    pub fn last_rate(&self) -> Option<f64> {
        self.last_rate
    }

    pub fn last_headline(&self) -> Option<&str> {
        self.last_headline.as_deref()
    }
}
