//! Stable cache file names for committed recordings

use std::fmt;
use std::path::{Path, PathBuf};

use super::date::DiaryDate;
use super::record::DiaryId;

/// File extension of every stored recording
pub const AUDIO_EXTENSION: &str = "wav";

/// Name under which a committed recording is kept in the cache directory.
///
/// Recordings belonging to a known diary entry are stored as
/// `voice_<diaryId>.wav`. Before the backend has assigned an id the
/// recording is keyed by its date, `recording_<yyyy-MM-dd>.wav`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Diary(DiaryId),
    Placeholder(DiaryDate),
}

impl StorageKey {
    /// Key for a diary id, falling back to the date placeholder
    pub fn resolve(diary_id: Option<DiaryId>, date: DiaryDate) -> Self {
        match diary_id {
            Some(id) => Self::Diary(id),
            None => Self::Placeholder(date),
        }
    }

    pub fn file_name(&self) -> String {
        match self {
            Self::Diary(id) => format!("voice_{}.{}", id, AUDIO_EXTENSION),
            Self::Placeholder(date) => format!("recording_{}.{}", date, AUDIO_EXTENSION),
        }
    }

    /// Full path of this key inside `dir`
    pub fn path_in(&self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_name())
    }
}
