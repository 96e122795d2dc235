//! Parse and validation errors raised by domain types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid duration format: \"{input}\". Expected format: <number>s, <number>m, or <number>m<number>s (e.g., 30s, 1m, 4m30s)")]
pub struct DurationParseError {
    pub input: String,
}

#[derive(Debug, Clone, Error)]
#[error("Invalid date: \"{input}\". Expected format: yyyy-MM-dd (e.g., 2024-05-17)")]
pub struct DateParseError {
    pub input: String,
}

/// Accepts English tags and Korean labels
#[derive(Debug, Clone, Error)]
#[error("Invalid emotion: \"{input}\". Valid emotions are: joy, sadness, anger, tired, neutral (or 기쁨, 슬픔, 화남, 지침, 중립)")]
pub struct InvalidEmotionError {
    pub input: String,
}

#[derive(Debug, Clone, Error)]
#[error("Invalid gender: \"{input}\". Expected male or female (or 남자, 여자)")]
pub struct InvalidGenderError {
    pub input: String,
}

/// Error when a `config get/set` key is not recognised
#[derive(Debug, Clone, Error)]
#[error("Unknown config key '{key}'. Valid keys: server_url, access_token, cache_dir, max_duration, notify")]
pub struct UnknownConfigKeyError {
    pub key: String,
}

/// Reading, writing or validating the config file
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Cannot read config file: {0}")]
    ReadError(String),

    #[error("Config file is not valid TOML: {0}")]
    ParseError(String),

    #[error("Cannot write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists: {0}")]
    AlreadyExists(String),
}

/// To-do list edits and the file holding the list
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TodoError {
    #[error("To-do text must not be empty")]
    EmptyText,

    #[error("No to-do with id {0}")]
    NotFound(u32),

    #[error("Cannot read to-do file: {0}")]
    ReadError(String),

    #[error("To-do file is not valid JSON: {0}")]
    ParseError(String),

    #[error("Cannot write to-do file: {0}")]
    WriteError(String),
}
