//! VPN Fleet Monitor Library

pub mod config;
pub mod fetcher;
pub mod http;
pub mod lifecycle;
pub mod poller;
pub mod store;

pub use config::AppConfig;
pub use http::ApiServer;
pub use lifecycle::Shutdown;
