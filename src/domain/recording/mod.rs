//! Recording domain: durations and the session state machine

pub mod duration;
pub mod session;

pub use duration::{Duration, DEFAULT_MAX_DURATION_SECS};
pub use session::{InvalidStateTransition, RecordingSession, SessionState, TickOutcome};
