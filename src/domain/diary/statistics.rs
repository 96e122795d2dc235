//! Emotion statistics over day records

use super::emotion::{Emotion, ALL_EMOTIONS};
use super::record::{Day, DiaryRecord};

/// Per-emotion counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmotionTally {
    counts: [u32; ALL_EMOTIONS.len()],
}

impl EmotionTally {
    pub fn record(&mut self, emotion: Emotion) {
        self.counts[emotion.index()] += 1;
    }

    pub fn count(&self, emotion: Emotion) -> u32 {
        self.counts[emotion.index()]
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    /// Most frequent emotion; ties resolve to the earlier entry of `ALL_EMOTIONS`
    pub fn dominant(&self) -> Option<Emotion> {
        let mut best: Option<Emotion> = None;
        for &emotion in ALL_EMOTIONS {
            let count = self.count(emotion);
            if count == 0 {
                continue;
            }
            if best.map_or(true, |b| count > self.count(b)) {
                best = Some(emotion);
            }
        }
        best
    }

    /// Iterate `(emotion, count)` in display order
    pub fn iter(&self) -> impl Iterator<Item = (Emotion, u32)> + '_ {
        ALL_EMOTIONS.iter().map(move |&e| (e, self.count(e)))
    }
}

/// Emotion statistics for one calendar year
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearlyStatistics {
    pub year: i32,
    pub total_diaries: usize,
    pub tally: EmotionTally,
    /// `grid[month0][day0]`, the emotion recorded on each day
    pub grid: [[Option<Emotion>; 31]; 12],
}

impl YearlyStatistics {
    pub fn compute(year: i32, diaries: &[DiaryRecord], days: &[Day]) -> Self {
        let total_diaries = diaries.iter().filter(|d| d.date.year() == year).count();

        let mut tally = EmotionTally::default();
        let mut grid = [[None; 31]; 12];

        for day in days.iter().filter(|d| d.date.year() == year) {
            if let Some(emotion) = day.emotion {
                tally.record(emotion);
                let month0 = (day.date.month() - 1) as usize;
                let day0 = (day.date.day() - 1) as usize;
                grid[month0][day0] = Some(emotion);
            }
        }

        Self {
            year,
            total_diaries,
            tally,
            grid,
        }
    }

    /// Emotions of one month (1-12)
    pub fn month(&self, month: u32) -> Option<&[Option<Emotion>; 31]> {
        let idx = month.checked_sub(1)? as usize;
        self.grid.get(idx)
    }
}

/// Emotion statistics for one month
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyStatistics {
    pub year: i32,
    pub month: u32,
    /// Number of day records in the month, with or without an emotion
    pub total_days: usize,
    pub tally: EmotionTally,
    /// `daily[day0]`, the emotion recorded on each day
    pub daily: [Option<Emotion>; 31],
}

impl MonthlyStatistics {
    pub fn compute(year: i32, month: u32, days: &[Day]) -> Self {
        let mut tally = EmotionTally::default();
        let mut daily = [None; 31];
        let mut total_days = 0;

        for day in days
            .iter()
            .filter(|d| d.date.year() == year && d.date.month() == month)
        {
            total_days += 1;
            if let Some(emotion) = day.emotion {
                tally.record(emotion);
                daily[(day.date.day() - 1) as usize] = Some(emotion);
            }
        }

        Self {
            year,
            month,
            total_days,
            tally,
            daily,
        }
    }
}
