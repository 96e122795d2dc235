//! Keys accepted by `memento config get/set`

use std::fmt;
use std::str::FromStr;

use crate::domain::error::{ConfigError, UnknownConfigKeyError};
use crate::domain::recording::Duration;

use super::AppConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    ServerUrl,
    AccessToken,
    CacheDir,
    MaxDuration,
    Notify,
}

impl ConfigKey {
    /// In the order `config list` prints them
    pub const ALL: [ConfigKey; 5] = [
        Self::ServerUrl,
        Self::AccessToken,
        Self::CacheDir,
        Self::MaxDuration,
        Self::Notify,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::ServerUrl => "server_url",
            Self::AccessToken => "access_token",
            Self::CacheDir => "cache_dir",
            Self::MaxDuration => "max_duration",
            Self::Notify => "notify",
        }
    }

    pub const fn is_secret(self) -> bool {
        matches!(self, Self::AccessToken)
    }

    /// Raw stored value, unmasked
    pub fn get(self, config: &AppConfig) -> Option<String> {
        match self {
            Self::ServerUrl => config.server_url.clone(),
            Self::AccessToken => config.access_token.clone(),
            Self::CacheDir => config.cache_dir.clone(),
            Self::MaxDuration => config.max_duration.clone(),
            Self::Notify => config.notify.map(|on| on.to_string()),
        }
    }

    /// Validate `raw` and store its normalized form
    pub fn set(self, config: &mut AppConfig, raw: &str) -> Result<(), ConfigError> {
        let raw = raw.trim();
        let reject = |message: &str| ConfigError::ValidationError {
            key: self.name().to_string(),
            message: message.to_string(),
        };

        match self {
            Self::ServerUrl => {
                if !(raw.starts_with("http://") || raw.starts_with("https://")) {
                    return Err(reject("URL must start with http:// or https://"));
                }
                config.server_url = Some(raw.trim_end_matches('/').to_string());
            }
            Self::AccessToken | Self::CacheDir if raw.is_empty() => {
                return Err(reject("Value must not be empty"));
            }
            Self::AccessToken => config.access_token = Some(raw.to_string()),
            Self::CacheDir => config.cache_dir = Some(raw.to_string()),
            Self::MaxDuration => {
                let duration = raw.parse::<Duration>().map_err(|e| reject(&e.to_string()))?;
                config.max_duration = Some(duration.to_string());
            }
            Self::Notify => {
                let on = parse_flag(raw)
                    .ok_or_else(|| reject("Expected true/false, yes/no or 1/0"))?;
                config.notify = Some(on);
            }
        }
        Ok(())
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    const ON: [&str; 4] = ["true", "yes", "on", "1"];
    const OFF: [&str; 4] = ["false", "no", "off", "0"];

    let raw = raw.to_ascii_lowercase();
    if ON.contains(&raw.as_str()) {
        Some(true)
    } else if OFF.contains(&raw.as_str()) {
        Some(false)
    } else {
        None
    }
}

impl FromStr for ConfigKey {
    type Err = UnknownConfigKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.name() == s)
            .ok_or_else(|| UnknownConfigKeyError {
                key: s.to_string(),
            })
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
