//! Adapters behind the application ports

mod atomic;
pub mod config;
pub mod diary;
pub mod notification;
pub mod playback;
pub mod recording;
pub mod storage;
pub mod todo;

pub use config::XdgConfigStore;
pub use diary::HttpDiaryClient;
pub use notification::{create_notifier, CompositeNotifier, ConsoleNotifier, NotifyRustNotifier};
pub use playback::RodioPlayback;
pub use recording::{create_capture, CpalCapture};
pub use storage::FsStorage;
pub use todo::JsonTodoStore;
