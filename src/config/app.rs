// src/config/app.rs
//! Application configuration: non-secret tunables from TOML, secrets from env.
//!
//! Built once at startup and shared read-only with every client.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_CONFIG_PATH: &str = "CURRENCY_PULSE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/app.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub upstream: UpstreamConfig,
    pub stream: StreamConfig,
    pub dashboard: DashboardConfig,
    pub news: NewsConfig,
    pub mail: MailConfig,
    /// Never read from the file; filled from the environment.
    #[serde(skip)]
    pub secrets: Secrets,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// exchangerate-api style base, e.g. `https://v6.exchangerate-api.com/v6`
    pub rates_url: String,
    /// currencyfreaks style time-series endpoint
    pub history_url: String,
    /// newsapi style top-headlines endpoint
    pub news_url: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            rates_url: "https://v6.exchangerate-api.com/v6".to_string(),
            history_url: "https://api.currencyfreaks.com/v2.0/rates/timeseries".to_string(),
            news_url: "https://newsapi.org/v2/top-headlines".to_string(),
            timeout_secs: 5,
            connect_timeout_secs: 3,
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub base: String,
    pub quote: String,
    pub interval_secs: u64,
    /// Upper bound for each fetch inside one tick.
    pub tick_budget_secs: u64,
    /// 0.0 keeps exact-equality change detection.
    pub rate_epsilon: f64,
    pub keep_alive_secs: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            base: "USD".to_string(),
            quote: "GHS".to_string(),
            interval_secs: 60,
            tick_budget_secs: 10,
            rate_epsilon: 0.0,
            keep_alive_secs: 15,
        }
    }
}

impl StreamConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn tick_budget(&self) -> Duration {
        Duration::from_secs(self.tick_budget_secs.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub base: String,
    pub history_quote: String,
    pub history_days: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base: "USD".to_string(),
            history_quote: "EUR".to_string(),
            history_days: 7,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    pub category: String,
    pub language: String,
    pub limit: usize,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            category: "business".to_string(),
            language: "en".to_string(),
            limit: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub server: String,
    /// 465 = implicit TLS, anything else = STARTTLS.
    pub port: u16,
    /// Defaults to the SMTP username when empty.
    pub recipient: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            server: "smtp.gmail.com".to_string(),
            port: 465,
            recipient: String::new(),
        }
    }
}

#[derive(Clone, Default)]
pub struct Secrets {
    pub exchange_api_key: String,
    pub currencyfreaks_api_key: String,
    pub news_api_key: String,
    pub mail_username: Option<String>,
    pub mail_password: Option<String>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |s: &str| if s.is_empty() { "<unset>" } else { "<redacted>" };
        f.debug_struct("Secrets")
            .field("exchange_api_key", &mask(&self.exchange_api_key))
            .field("currencyfreaks_api_key", &mask(&self.currencyfreaks_api_key))
            .field("news_api_key", &mask(&self.news_api_key))
            .field("mail_username", &self.mail_username)
            .field("mail_password", &self.mail_password.as_deref().map(mask))
            .finish()
    }
}

impl Secrets {
    pub fn from_env() -> Self {
        let var = |k: &str| std::env::var(k).unwrap_or_default().trim().to_string();
        let opt = |k: &str| {
            std::env::var(k)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            exchange_api_key: var("EXCHANGE_API_KEY"),
            currencyfreaks_api_key: var("CURRENCYFREAKS_API_KEY"),
            news_api_key: var("NEWS_API_KEY"),
            mail_username: opt("MAIL_USERNAME"),
            mail_password: opt("MAIL_PASSWORD"),
        }
    }
}

impl AppConfig {
    /// Parse a TOML document. Missing sections and keys fall back to defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: AppConfig = toml::from_str(s).context("parsing app config TOML")?;
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading app config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Resolve the config file:
    /// 1) $CURRENCY_PULSE_CONFIG (must exist)
    /// 2) config/app.toml
    /// 3) built-in defaults
    pub fn load_file_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default_p.exists() {
            return Self::load_from(&default_p);
        }
        Ok(Self::default())
    }

    /// File (or defaults), then secrets and overrides from env.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::load_file_default()?;
        cfg.apply_env_overrides();
        cfg.secrets = Secrets::from_env();
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("MAIL_SERVER") {
            if !v.trim().is_empty() {
                self.mail.server = v.trim().to_string();
            }
        }
        if let Some(port) = std::env::var("MAIL_PORT")
            .ok()
            .and_then(|v| v.trim().parse::<u16>().ok())
        {
            self.mail.port = port;
        }
        if let Ok(v) = std::env::var("MAIL_RECIPIENT") {
            if !v.trim().is_empty() {
                self.mail.recipient = v.trim().to_string();
            }
        }
        if let Some(secs) = std::env::var("STREAM_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            self.stream.interval_secs = secs;
        }
    }

    /// Contact-form recipient: explicit config first, then the SMTP user.
    pub fn mail_recipient(&self) -> Option<&str> {
        if !self.mail.recipient.is_empty() {
            return Some(self.mail.recipient.as_str());
        }
        self.secrets.mail_username.as_deref()
    }
}
