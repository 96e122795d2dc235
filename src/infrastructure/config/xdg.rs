//! Config file under the XDG config directory

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::application::ports::ConfigStore;
use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;
use crate::infrastructure::atomic;

const APP_DIR: &str = "memento";
const FILE_NAME: &str = "config.toml";

/// `$XDG_CONFIG_HOME/memento/config.toml` (or the platform equivalent)
pub struct XdgConfigStore {
    path: PathBuf,
}

impl XdgConfigStore {
    pub fn new() -> Self {
        Self::with_path(default_location())
    }

    /// Store backed by an explicit file, used by tests
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn decode(text: &str) -> Result<AppConfig, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    fn encode(config: &AppConfig) -> Result<String, ConfigError> {
        toml::to_string_pretty(config).map_err(|e| ConfigError::WriteError(e.to_string()))
    }
}

impl Default for XdgConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

fn default_location() -> PathBuf {
    let base = dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .unwrap_or_default();
    base.join(APP_DIR).join(FILE_NAME)
}

#[async_trait]
impl ConfigStore for XdgConfigStore {
    async fn load(&self) -> Result<AppConfig, ConfigError> {
        match fs::read_to_string(&self.path).await {
            Ok(text) => Self::decode(&text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no config file");
                Ok(AppConfig::empty())
            }
            Err(e) => Err(ConfigError::ReadError(format!(
                "{}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        let text = Self::encode(config)?;
        atomic::replace(&self.path, text.as_bytes())
            .await
            .map_err(|(path, e)| ConfigError::WriteError(format!("{}: {}", path.display(), e)))?;
        debug!(path = %self.path.display(), "config saved");
        Ok(())
    }

    fn path(&self) -> PathBuf {
        self.path.clone()
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }

    async fn init(&self) -> Result<(), ConfigError> {
        if self.exists() {
            return Err(ConfigError::AlreadyExists(self.path.display().to_string()));
        }
        self.save(&AppConfig::defaults()).await
    }
}
