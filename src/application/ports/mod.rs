//! Traits the use cases are written against; `infrastructure` implements them

pub mod account_api;
pub mod capture;
pub mod config;
pub mod diary_api;
pub mod notifier;
pub mod playback;
pub mod storage;
pub mod todo;

pub use account_api::AccountApi;
pub use capture::{AudioCapture, CaptureError, CaptureHandle};
pub use config::ConfigStore;
pub use diary_api::{DiaryApi, DiaryApiError};
pub use notifier::{NotificationError, NoticeKind, Notifier};
pub use playback::{AudioPlayback, CompletionCallback, PlaybackError, PlaybackHandle};
pub use storage::{FileStorage, StorageError};
pub use todo::TodoStore;
