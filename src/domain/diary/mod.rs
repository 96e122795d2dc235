//! Diary domain: dates, emotions, backend records and statistics

pub mod date;
pub mod emotion;
pub mod record;
pub mod statistics;
pub mod storage_key;

pub use date::DiaryDate;
pub use emotion::{Emotion, ALL_EMOTIONS};
pub use record::{AudioAttachment, Day, DiaryId, DiaryRecord, DiarySubmission};
pub use statistics::{EmotionTally, MonthlyStatistics, YearlyStatistics};
pub use storage_key::{StorageKey, AUDIO_EXTENSION};
