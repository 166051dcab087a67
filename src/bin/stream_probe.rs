//! Runs the notification loop against the configured upstreams and prints
//! each event as a JSON line. Ctrl-C to stop.

use std::sync::Arc;

use anyhow::Result;
use currency_pulse::config::AppConfig;
use currency_pulse::notify::{run_stream, StreamSettings};
use currency_pulse::upstream::{build_http_client, NewsClient, RatesClient};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    currency_pulse::init_tracing();

    let cfg = AppConfig::from_env()?;
    let http = build_http_client(&cfg)?;
    let rates = Arc::new(RatesClient::new(http.clone(), &cfg));
    let news = Arc::new(NewsClient::new(http, &cfg));

    let (tx, mut rx) = mpsc::channel(16);
    let worker = tokio::spawn(run_stream(
        rates,
        news,
        StreamSettings::from(&cfg.stream),
        tx,
    ));

    loop {
        tokio::select! {
            ev = rx.recv() => match ev {
                Some(ev) => println!("{}", serde_json::to_string(&ev)?),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    drop(rx);
    let _ = worker.await;
    println!("stream-probe done");
    Ok(())
}
