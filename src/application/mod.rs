//! Use cases, each generic over the ports it needs

pub mod diary;
pub mod playback;
pub mod ports;
pub mod recording;
pub mod statistics;

pub use diary::{DiaryError, DiaryService, MIN_AUDIO_BYTES};
pub use playback::{PlaybackControlError, PlaybackController, PlaybackState};
pub use recording::{RecordingConfig, RecordingError, RecordingSessionManager, SessionStatus};
pub use statistics::{StatisticsError, StatisticsService};
