// src/notify/stream.rs
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};

use super::{NotificationEvent, NotificationState};
use crate::config::StreamConfig;
use crate::upstream::{HeadlineFeed, RateFeed};

#[derive(Debug, Clone)]
pub struct StreamSettings {
    pub base: String,
    pub quote: String,
    pub interval: Duration,
    pub tick_budget: Duration,
    pub rate_epsilon: f64,
}

impl From<&StreamConfig> for StreamSettings {
    fn from(cfg: &StreamConfig) -> Self {
        Self {
            base: cfg.base.clone(),
            quote: cfg.quote.clone(),
            interval: cfg.interval(),
            tick_budget: cfg.tick_budget(),
            rate_epsilon: cfg.rate_epsilon,
        }
    }
}

fn fetch_failed(feed: &'static str, err: &str) {
    tracing::warn!(target: "stream", feed, error = %err, "stream fetch failed; skipping this check");
    counter!("upstream_errors_total", "client" => feed).increment(1);
}

/// One poll of both feeds. A failed or timed-out fetch skips its check and
/// leaves the corresponding state untouched.
pub async fn tick<R, H>(
    state: &mut NotificationState,
    rates: &R,
    news: &H,
    settings: &StreamSettings,
) -> Vec<NotificationEvent>
where
    R: RateFeed + ?Sized,
    H: HeadlineFeed + ?Sized,
{
    let mut out = Vec::with_capacity(2);

    match time::timeout(
        settings.tick_budget,
        rates.pair_rate(&settings.base, &settings.quote),
    )
    .await
    {
        Ok(Ok(rate)) => {
            if let Some(ev) = state.observe_rate(&settings.base, &settings.quote, rate) {
                out.push(ev);
            }
        }
        Ok(Err(e)) => fetch_failed("stream_rate", &format!("{e:#}")),
        Err(_) => fetch_failed("stream_rate", "tick budget exceeded"),
    }

    match time::timeout(settings.tick_budget, news.latest_headline()).await {
        Ok(Ok(Some(headline))) => {
            if let Some(ev) = state.observe_headline(&headline) {
                out.push(ev);
            }
        }
        Ok(Ok(None)) => tracing::trace!(target: "stream", "no headlines this tick"),
        Ok(Err(e)) => fetch_failed("stream_news", &format!("{e:#}")),
        Err(_) => fetch_failed("stream_news", "tick budget exceeded"),
    }

    out
}

/// Poll on a fixed interval until the subscriber goes away.
///
/// Returns when `tx` is closed: either detected while waiting for the next
/// tick or when delivering an event fails.
pub async fn run_stream(
    rates: Arc<dyn RateFeed>,
    news: Arc<dyn HeadlineFeed>,
    settings: StreamSettings,
    tx: mpsc::Sender<NotificationEvent>,
) {
    let mut state = NotificationState::new(settings.rate_epsilon);
    let mut ticker = time::interval(settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(
        target: "stream",
        base = %settings.base,
        quote = %settings.quote,
        interval_secs = settings.interval.as_secs(),
        "notification stream opened"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tx.closed() => {
                tracing::info!(target: "stream", "subscriber disconnected; stopping stream");
                return;
            }
        }

        let events = tick(&mut state, rates.as_ref(), news.as_ref(), &settings).await;
        if events.is_empty() {
            tracing::debug!(target: "stream", "no change this tick");
        }

        for ev in events {
            counter!("stream_events_total", "kind" => ev.kind.as_str()).increment(1);
            if tx.send(ev).await.is_err() {
                tracing::info!(target: "stream", "subscriber disconnected; stopping stream");
                return;
            }
        }
    }
}
