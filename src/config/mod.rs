// src/config/mod.rs
pub mod app;

pub use app::{
    AppConfig, DashboardConfig, MailConfig, NewsConfig, Secrets, StreamConfig, UpstreamConfig,
};
