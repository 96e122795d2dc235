//! Value objects, entities and errors; nothing here touches devices, files or the network

pub mod account;
pub mod config;
pub mod diary;
pub mod error;
pub mod recording;
pub mod todo;

pub use account::{AgeGroup, Gender, Signup, UserProfile};
pub use config::AppConfig;
pub use diary::{
    AudioAttachment, Day, DiaryDate, DiaryId, DiaryRecord, DiarySubmission, Emotion,
    MonthlyStatistics, StorageKey, YearlyStatistics,
};
pub use error::*;
pub use recording::{Duration, InvalidStateTransition, RecordingSession, SessionState};
pub use todo::{TodoItem, TodoList};
