//! Settings shared by every command

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::recording::Duration;

/// Backend used when nothing else is configured
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

/// One configuration layer: defaults, file, environment or flags.
/// `None` means "this layer does not say"; the `*_or_default` accessors resolve the final value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub server_url: Option<String>,
    pub access_token: Option<String>,
    pub cache_dir: Option<String>,
    pub max_duration: Option<String>,
    pub notify: Option<bool>,
}

impl AppConfig {
    /// Bottom layer, also what `config init` writes
    pub fn defaults() -> Self {
        Self {
            server_url: Some(DEFAULT_SERVER_URL.to_string()),
            access_token: None,
            cache_dir: None,
            max_duration: Some("5m".to_string()),
            notify: Some(false),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Stack `upper` on top of `self`; fields `upper` leaves unset fall through
    pub fn merge(self, upper: Self) -> Self {
        Self {
            server_url: upper.server_url.or(self.server_url),
            access_token: upper.access_token.or(self.access_token),
            cache_dir: upper.cache_dir.or(self.cache_dir),
            max_duration: upper.max_duration.or(self.max_duration),
            notify: upper.notify.or(self.notify),
        }
    }

    /// Get server URL without a trailing slash, or the default
    pub fn server_url_or_default(&self) -> String {
        self.server_url
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_SERVER_URL)
            .trim()
            .trim_end_matches('/')
            .to_string()
    }

    /// An unparseable stored value counts as unset
    pub fn max_duration_or_default(&self) -> Duration {
        match self.max_duration.as_deref().map(str::parse::<Duration>) {
            Some(Ok(duration)) => duration,
            _ => Duration::default_max_duration(),
        }
    }

    /// Directory committed recordings are stored in.
    /// Falls back to the platform cache dir.
    pub fn cache_dir_or_default(&self) -> PathBuf {
        match self.cache_dir.as_deref().filter(|s| !s.is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("memento"),
        }
    }

    /// Desktop notifications are opt-in
    pub fn notify_or_default(&self) -> bool {
        self.notify == Some(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(server_url: Option<&str>, token: Option<&str>, notify: Option<bool>) -> AppConfig {
        AppConfig {
            server_url: server_url.map(str::to_string),
            access_token: token.map(str::to_string),
            notify,
            ..AppConfig::empty()
        }
    }

    #[test]
    fn defaults_cover_server_duration_and_notify() {
        let config = AppConfig::defaults();
        assert_eq!(config.server_url.as_deref(), Some(DEFAULT_SERVER_URL));
        assert_eq!(config.max_duration.as_deref(), Some("5m"));
        assert_eq!(config.notify, Some(false));
        assert_eq!(config.access_token, None);
        assert_eq!(config.cache_dir, None);
    }

    #[test]
    fn empty_layer_changes_nothing() {
        assert_eq!(AppConfig::defaults().merge(AppConfig::empty()), AppConfig::defaults());
        assert_eq!(AppConfig::empty().merge(AppConfig::defaults()), AppConfig::defaults());
    }

    #[test]
    fn later_layers_win_field_by_field() {
        let file = layer(Some("http://file"), Some("file-token"), Some(true));
        let env = layer(None, Some("env-token"), None);
        let flags = layer(Some("http://flag"), None, None);

        let merged = AppConfig::defaults().merge(file).merge(env).merge(flags);

        assert_eq!(merged.server_url.as_deref(), Some("http://flag"));
        assert_eq!(merged.access_token.as_deref(), Some("env-token"));
        assert_eq!(merged.notify, Some(true));
        assert_eq!(merged.max_duration.as_deref(), Some("5m"));
    }

    #[test]
    fn server_url_is_trimmed_or_defaulted() {
        let cases = [
            (Some("https://diary.example.com/ "), "https://diary.example.com"),
            (Some("  "), DEFAULT_SERVER_URL),
            (None, DEFAULT_SERVER_URL),
        ];
        for (configured, expected) in cases {
            assert_eq!(layer(configured, None, None).server_url_or_default(), expected);
        }
    }

    #[test]
    fn bad_max_duration_falls_back() {
        let mut config = AppConfig {
            max_duration: Some("90s".to_string()),
            ..AppConfig::empty()
        };
        assert_eq!(config.max_duration_or_default().as_secs(), 90);

        config.max_duration = Some("forever".to_string());
        assert_eq!(config.max_duration_or_default(), Duration::default_max_duration());
    }

    #[test]
    fn cache_dir_configured_or_platform() {
        let config = AppConfig {
            cache_dir: Some("/var/tmp/memento".to_string()),
            ..AppConfig::empty()
        };
        assert_eq!(config.cache_dir_or_default(), PathBuf::from("/var/tmp/memento"));
        assert!(AppConfig::empty().cache_dir_or_default().ends_with("memento"));
    }

    #[test]
    fn notify_is_off_unless_enabled() {
        assert!(!AppConfig::empty().notify_or_default());
        assert!(!layer(None, None, Some(false)).notify_or_default());
        assert!(layer(None, None, Some(true)).notify_or_default());
    }
}
