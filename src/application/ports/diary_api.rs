//! Remote diary backend port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::diary::{Day, DiaryDate, DiaryId, DiaryRecord, DiarySubmission, Emotion};

/// Diary backend errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiaryApiError {
    #[error("Not logged in or session expired. Run 'memento login' first")]
    Unauthorized,

    #[error("Diary entry is finalized and can no longer be changed")]
    ReadOnly,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    #[error("API error: {0}")]
    ApiError(String),
}

/// Port for the remote diary backend
#[async_trait]
pub trait DiaryApi: Send + Sync {
    /// Fetch the diary entry of a date, `None` if the date has no entry
    async fn get_diary(&self, date: DiaryDate) -> Result<Option<DiaryRecord>, DiaryApiError>;

    /// All diary entries of the current user
    async fn list_diaries(&self) -> Result<Vec<DiaryRecord>, DiaryApiError>;

    /// Save a draft entry (create or overwrite)
    async fn save_diary(&self, submission: &DiarySubmission) -> Result<DiaryRecord, DiaryApiError>;

    /// Save and lock an entry; the backend attaches emotion and comment
    async fn finalize_diary(
        &self,
        submission: &DiarySubmission,
    ) -> Result<DiaryRecord, DiaryApiError>;

    /// Set the emotion of a calendar day
    async fn update_day_emotion(
        &self,
        date: DiaryDate,
        emotion: Emotion,
    ) -> Result<Day, DiaryApiError>;

    /// All day records of the current user
    async fn list_days(&self) -> Result<Vec<Day>, DiaryApiError>;

    /// Raw bytes of the audio stored for a diary entry
    async fn download_audio(&self, id: DiaryId) -> Result<Vec<u8>, DiaryApiError>;

    /// Exchange credentials for an access token
    async fn login(&self, email: &str, password: &str) -> Result<String, DiaryApiError>;
}
