//! Diary client use cases
//!
//! Hands recordings off to the remote diary backend and fetches entries
//! and stored audio back.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::account::{Signup, UserProfile};
use crate::domain::diary::{
    AudioAttachment, Day, DiaryDate, DiaryRecord, DiarySubmission, Emotion, StorageKey,
};

use super::ports::{AccountApi, DiaryApi, DiaryApiError, FileStorage, StorageError};

/// Downloaded audio smaller than this is treated as corrupt
pub const MIN_AUDIO_BYTES: u64 = 1000;

/// Errors from the diary use cases
#[derive(Debug, Error)]
pub enum DiaryError {
    #[error("{0}")]
    Api(#[from] DiaryApiError),

    #[error("{0}")]
    Storage(#[from] StorageError),

    #[error("Diary entry has no backend id yet")]
    MissingId,

    #[error("New password must differ from the current one")]
    SamePassword,
}

/// Diary service over the backend and local cache
pub struct DiaryService<A: DiaryApi, S: FileStorage> {
    api: A,
    storage: S,
    cache_dir: PathBuf,
}

impl<A: DiaryApi, S: FileStorage> DiaryService<A, S> {
    pub fn new(api: A, storage: S, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            api,
            storage,
            cache_dir: cache_dir.into(),
        }
    }

    /// Entry of a date, `None` when nothing was written yet
    pub async fn load(&self, date: DiaryDate) -> Result<Option<DiaryRecord>, DiaryError> {
        Ok(self.api.get_diary(date).await?)
    }

    pub async fn list(&self) -> Result<Vec<DiaryRecord>, DiaryError> {
        Ok(self.api.list_diaries().await?)
    }

    /// Save a text-only draft
    pub async fn save_text(
        &self,
        date: DiaryDate,
        content: &str,
    ) -> Result<DiaryRecord, DiaryError> {
        let submission = DiarySubmission::text(date, content);
        let record = self.api.save_diary(&submission).await?;
        info!(%date, "diary draft saved");
        Ok(record)
    }

    /// Save a draft with the recording at `audio_path` attached
    pub async fn save_voice(
        &self,
        date: DiaryDate,
        content: &str,
        audio_path: &Path,
    ) -> Result<DiaryRecord, DiaryError> {
        let submission = self.submission(date, content, Some(audio_path)).await?;
        let record = self.api.save_diary(&submission).await?;
        info!(%date, audio = %audio_path.display(), "voice diary draft saved");
        Ok(record)
    }

    /// Save and lock the entry; the backend attaches emotion and comment.
    ///
    /// The local recording is left untouched, so a failed finalize can be
    /// retried without recording again.
    pub async fn finalize(
        &self,
        date: DiaryDate,
        content: &str,
        audio_path: Option<&Path>,
    ) -> Result<DiaryRecord, DiaryError> {
        let submission = self.submission(date, content, audio_path).await?;
        let record = self.api.finalize_diary(&submission).await?;
        info!(
            %date,
            emotion = record.emotion.map(|e| e.as_str()).unwrap_or("none"),
            "diary finalized"
        );
        Ok(record)
    }

    pub async fn set_emotion(&self, date: DiaryDate, emotion: Emotion) -> Result<Day, DiaryError> {
        let day = self.api.update_day_emotion(date, emotion).await?;
        info!(%date, emotion = emotion.as_str(), "day emotion updated");
        Ok(day)
    }

    /// Exchange credentials for an access token
    pub async fn login(&self, email: &str, password: &str) -> Result<String, DiaryError> {
        Ok(self.api.login(email, password).await?)
    }

    /// Download the audio stored for `record` into the cache.
    ///
    /// # Returns
    /// The cached file, or `None` when the entry has no usable audio
    pub async fn download_audio(
        &self,
        record: &DiaryRecord,
    ) -> Result<Option<PathBuf>, DiaryError> {
        let id = record.id.ok_or(DiaryError::MissingId)?;
        if !record.has_audio() {
            debug!(%id, "diary entry has no audio");
            return Ok(None);
        }

        let data = self.api.download_audio(id).await?;
        let target = StorageKey::Diary(id).path_in(&self.cache_dir);

        if self.storage.exists(&target).await {
            self.storage.delete(&target, true).await?;
        }
        self.storage.write(&target, &data).await?;

        let size = self.storage.size(&target).await?;
        if size < MIN_AUDIO_BYTES {
            warn!(%id, size, "downloaded audio too small, discarding");
            self.storage.delete(&target, true).await?;
            return Ok(None);
        }

        info!(%id, path = %target.display(), size, "audio downloaded");
        Ok(Some(target))
    }

    async fn submission(
        &self,
        date: DiaryDate,
        content: &str,
        audio_path: Option<&Path>,
    ) -> Result<DiarySubmission, DiaryError> {
        let Some(path) = audio_path else {
            return Ok(DiarySubmission::text(date, content));
        };
        let data = self.storage.read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| StorageKey::Placeholder(date).file_name());
        Ok(DiarySubmission::voice(
            date,
            content,
            AudioAttachment::new(file_name, data),
        ))
    }
}

impl<A: DiaryApi + AccountApi, S: FileStorage> DiaryService<A, S> {
    pub async fn signup(&self, signup: &Signup) -> Result<(), DiaryError> {
        self.api.signup(signup).await?;
        info!(email = %signup.email, "account created");
        Ok(())
    }

    pub async fn whoami(&self) -> Result<UserProfile, DiaryError> {
        Ok(self.api.current_user().await?)
    }

    pub async fn change_password(&self, current: &str, new: &str) -> Result<(), DiaryError> {
        if current == new {
            return Err(DiaryError::SamePassword);
        }
        self.api.change_password(current, new).await?;
        info!("password changed");
        Ok(())
    }
}
