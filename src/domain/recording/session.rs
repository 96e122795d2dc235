//! Recording session state machine

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use thiserror::Error;

use super::duration::Duration;
use crate::domain::diary::DiaryDate;

/// Recording session states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Recording,
    Paused,
    Stopped,
}

impl SessionState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        }
    }

    /// Whether a capture resource is held in this state
    pub const fn holds_capture(&self) -> bool {
        matches!(self, Self::Recording | Self::Paused)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid state transition: cannot {action} while {current_state}")]
pub struct InvalidStateTransition {
    pub current_state: SessionState,
    pub action: String,
}

/// Result of one elapsed-time tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not recording; nothing counted
    Ignored,
    /// One second counted, limit not yet reached
    Counted,
    /// The maximum duration has been reached
    LimitReached,
}

/// Recording session entity.
/// Tracks the lifecycle of one audio capture.
///
/// State machine:
///   IDLE -> RECORDING (begin)
///   RECORDING -> PAUSED (pause)
///   PAUSED -> RECORDING (resume)
///   RECORDING | PAUSED -> STOPPED (stop)
///   any -> IDLE (reset)
#[derive(Debug, Clone)]
pub struct RecordingSession {
    state: SessionState,
    max_duration: Duration,
    date: Option<DiaryDate>,
    started_at: Option<DateTime<Local>>,
    elapsed_seconds: u64,
    local_file: Option<PathBuf>,
    committed: bool,
}

impl RecordingSession {
    /// Create an idle session with the given duration limit
    pub fn new(max_duration: Duration) -> Self {
        Self {
            state: SessionState::Idle,
            max_duration,
            date: None,
            started_at: None,
            elapsed_seconds: 0,
            local_file: None,
            committed: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == SessionState::Idle
    }

    pub fn is_recording(&self) -> bool {
        self.state == SessionState::Recording
    }

    pub fn is_paused(&self) -> bool {
        self.state == SessionState::Paused
    }

    pub fn is_stopped(&self) -> bool {
        self.state == SessionState::Stopped
    }

    pub fn max_duration(&self) -> Duration {
        self.max_duration
    }

    /// Diary date this recording belongs to
    pub fn date(&self) -> Option<DiaryDate> {
        self.date
    }

    pub fn started_at(&self) -> Option<DateTime<Local>> {
        self.started_at
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_secs(self.elapsed_seconds)
    }

    /// Time left before the forced stop
    pub fn remaining(&self) -> Duration {
        Duration::from_secs(self.max_duration.as_secs().saturating_sub(self.elapsed_seconds))
    }

    /// Captured file: the temporary capture path until committed, the
    /// stable cache path afterwards
    pub fn local_file(&self) -> Option<&Path> {
        self.local_file.as_deref()
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Transition from IDLE to RECORDING
    pub fn begin(&mut self, date: DiaryDate) -> Result<(), InvalidStateTransition> {
        self.expect(&[SessionState::Idle], "start recording")?;
        self.state = SessionState::Recording;
        self.date = Some(date);
        self.started_at = Some(Local::now());
        self.elapsed_seconds = 0;
        self.local_file = None;
        self.committed = false;
        Ok(())
    }

    /// Transition from RECORDING to PAUSED
    pub fn pause(&mut self) -> Result<(), InvalidStateTransition> {
        self.expect(&[SessionState::Recording], "pause recording")?;
        self.state = SessionState::Paused;
        Ok(())
    }

    /// Transition from PAUSED to RECORDING, keeping the elapsed count
    pub fn resume(&mut self) -> Result<(), InvalidStateTransition> {
        self.expect(&[SessionState::Paused], "resume recording")?;
        self.state = SessionState::Recording;
        Ok(())
    }

    /// Check that a stop is allowed without changing state
    pub fn ensure_can_stop(&self) -> Result<(), InvalidStateTransition> {
        self.expect(
            &[SessionState::Recording, SessionState::Paused],
            "stop recording",
        )
    }

    /// Transition from RECORDING or PAUSED to STOPPED
    pub fn stop(&mut self, local_file: PathBuf) -> Result<(), InvalidStateTransition> {
        self.ensure_can_stop()?;
        self.state = SessionState::Stopped;
        self.local_file = Some(local_file);
        Ok(())
    }

    /// Check that the session holds an uncommitted capture file
    pub fn ensure_can_commit(&self) -> Result<&Path, InvalidStateTransition> {
        self.expect(&[SessionState::Stopped], "commit recording")?;
        match (&self.local_file, self.committed) {
            (Some(path), false) => Ok(path),
            _ => Err(InvalidStateTransition {
                current_state: self.state,
                action: "commit an already committed recording".to_string(),
            }),
        }
    }

    /// Record the stable path of a successfully committed file
    pub fn mark_committed(&mut self, stable: PathBuf) -> Result<(), InvalidStateTransition> {
        self.ensure_can_commit()?;
        self.local_file = Some(stable);
        self.committed = true;
        Ok(())
    }

    /// Count one second of recording.
    ///
    /// Time only advances while RECORDING and never past the limit.
    pub fn tick(&mut self) -> TickOutcome {
        if self.state != SessionState::Recording {
            return TickOutcome::Ignored;
        }
        let max = self.max_duration.as_secs();
        if self.elapsed_seconds >= max {
            return TickOutcome::LimitReached;
        }
        self.elapsed_seconds += 1;
        if self.elapsed_seconds >= max {
            TickOutcome::LimitReached
        } else {
            TickOutcome::Counted
        }
    }

    /// Return to IDLE from any state
    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.date = None;
        self.started_at = None;
        self.elapsed_seconds = 0;
        self.local_file = None;
        self.committed = false;
    }

    fn expect(&self, allowed: &[SessionState], action: &str) -> Result<(), InvalidStateTransition> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(InvalidStateTransition {
                current_state: self.state,
                action: action.to_string(),
            })
        }
    }
}

impl Default for RecordingSession {
    fn default() -> Self {
        Self::new(Duration::default_max_duration())
    }
}
