//! Diary date value object

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::error::DateParseError;

/// Wire format used by the backend for diary and day keys
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Calendar date that identifies a diary entry (`yyyy-MM-dd`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiaryDate(NaiveDate);

impl DiaryDate {
    /// Wrap a calendar date
    pub const fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Build from year, month (1-12) and day (1-31)
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Today's date in the local timezone
    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Month, 1-12
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Day of month, 1-31
    pub fn day(&self) -> u32 {
        self.0.day()
    }
}

impl FromStr for DiaryDate {
    type Err = DateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
            .map(Self)
            .map_err(|_| DateParseError {
                input: s.to_string(),
            })
    }
}

impl fmt::Display for DiaryDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl From<NaiveDate> for DiaryDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}
