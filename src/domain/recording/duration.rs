//! Whole-second spans: recording limit and elapsed time

use std::fmt;
use std::str::FromStr;

use crate::domain::error::DurationParseError;

pub const DEFAULT_MAX_DURATION_SECS: u64 = 300;

/// Written as `30s`, `5m` or `4m30s` in config files and flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Duration {
    seconds: u64,
}

impl Duration {
    pub const fn from_secs(secs: u64) -> Self {
        Self { seconds: secs }
    }

    pub const fn from_mins(mins: u64) -> Self {
        Self {
            seconds: mins * 60,
        }
    }

    /// Five minutes
    pub const fn default_max_duration() -> Self {
        Self::from_secs(DEFAULT_MAX_DURATION_SECS)
    }

    pub const fn as_secs(&self) -> u64 {
        self.seconds
    }

    /// `mm:ss`, minutes keep growing past 59
    pub fn as_clock(&self) -> String {
        format!("{:02}:{:02}", self.seconds / 60, self.seconds % 60)
    }
}

/// Digits only, no sign
fn whole_number(digits: &str) -> Option<u64> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

impl FromStr for Duration {
    type Err = DurationParseError;

    /// Accepts `<n>s`, `<n>m` and `<n>m<n>s`, case-insensitive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DurationParseError {
            input: s.to_string(),
        };
        let normalized = s.trim().to_ascii_lowercase();

        let (minutes, rest) = match normalized.split_once('m') {
            Some((mins, rest)) => (whole_number(mins).ok_or_else(invalid)?, rest),
            None => (0, normalized.as_str()),
        };
        let seconds = match rest {
            "" if normalized.contains('m') => 0,
            _ => rest
                .strip_suffix('s')
                .and_then(whole_number)
                .ok_or_else(invalid)?,
        };

        let total = minutes
            .checked_mul(60)
            .and_then(|secs| secs.checked_add(seconds))
            .filter(|&secs| secs > 0)
            .ok_or_else(invalid)?;

        Ok(Self::from_secs(total))
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.seconds / 60, self.seconds % 60) {
            (0, secs) => write!(f, "{}s", secs),
            (mins, 0) => write!(f, "{}m", mins),
            (mins, secs) => write!(f, "{}m{}s", mins, secs),
        }
    }
}

impl Default for Duration {
    fn default() -> Self {
        Self::default_max_duration()
    }
}
