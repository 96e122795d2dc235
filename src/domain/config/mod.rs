//! Configuration domain

pub mod app_config;
pub mod key;

pub use app_config::{AppConfig, DEFAULT_SERVER_URL};
pub use key::ConfigKey;
