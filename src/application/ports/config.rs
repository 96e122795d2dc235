//! Where the user config file lives

use std::path::PathBuf;

use async_trait::async_trait;

use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;

/// Port for the persisted user configuration
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Read the stored config; a missing file yields an empty config
    async fn load(&self) -> Result<AppConfig, ConfigError>;

    /// Replace the stored config, creating parent directories as needed
    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError>;

    fn path(&self) -> PathBuf;

    fn exists(&self) -> bool;

    /// Write [`AppConfig::defaults`]; fails with `AlreadyExists` if a file is there
    async fn init(&self) -> Result<(), ConfigError>;
}
