//! Terminal output: status lines on stderr, data on stdout

use std::time::Duration;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::domain::account::UserProfile;
use crate::domain::diary::{
    Day, DiaryRecord, Emotion, EmotionTally, MonthlyStatistics, YearlyStatistics,
};
use crate::domain::recording::SessionState;
use crate::domain::todo::TodoItem;

const BAR_CELLS: u64 = 20;

/// Leading glyph of a status line
#[derive(Clone, Copy)]
enum Mark {
    Info,
    Done,
    Warn,
    Fail,
}

impl Mark {
    fn glyph(self) -> ColoredString {
        match self {
            Mark::Info => "ℹ".cyan(),
            Mark::Done => "✓".green(),
            Mark::Warn => "⚠".yellow(),
            Mark::Fail => "✗".red(),
        }
    }

    fn line(self, message: &str) -> String {
        format!("{} {}", self.glyph(), message)
    }
}

/// Owns the single in-flight spinner, if any
pub struct Presenter {
    spinner: Option<ProgressBar>,
}

impl Presenter {
    pub fn new() -> Self {
        Self { spinner: None }
    }

    /// Replaces any spinner already running
    pub fn start_spinner(&mut self, message: &str) {
        self.stop_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
        let spinner = ProgressBar::new_spinner()
            .with_style(style)
            .with_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(80));
        self.spinner = Some(spinner);
    }

    pub fn spinner_success(&mut self, message: &str) {
        self.finish_spinner(Mark::Done, message);
    }

    pub fn spinner_fail(&mut self, message: &str) {
        self.finish_spinner(Mark::Fail, message);
    }

    /// Clears the spinner line without leaving a status behind
    pub fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    fn finish_spinner(&mut self, mark: Mark, message: &str) {
        match self.spinner.take() {
            Some(spinner) => spinner.finish_with_message(mark.line(message)),
            None => self.status(mark, message),
        }
    }

    pub fn info(&self, message: &str) {
        self.status(Mark::Info, message);
    }

    pub fn success(&self, message: &str) {
        self.status(Mark::Done, message);
    }

    pub fn warn(&self, message: &str) {
        self.status(Mark::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.status(Mark::Fail, message);
    }

    /// Plain data line on stdout, safe to pipe
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }

    fn status(&self, mark: Mark, message: &str) {
        let line = mark.line(message);
        match &self.spinner {
            Some(spinner) => spinner.suspend(|| eprintln!("{}", line)),
            None => eprintln!("{}", line),
        }
    }

    /// `[bar] mm:ss / mm:ss`, bar full once the limit is reached
    pub fn format_progress(&self, elapsed_secs: u64, max_secs: u64) -> String {
        let filled = match max_secs {
            0 => 0,
            max => (elapsed_secs.min(max) * BAR_CELLS / max) as usize,
        };
        let empty = BAR_CELLS as usize - filled;

        format!(
            "[{}{}] {} / {}",
            "█".repeat(filled).cyan(),
            "░".repeat(empty),
            clock(elapsed_secs),
            clock(max_secs)
        )
    }

    /// Rewrites the running spinner's line; no-op without one
    pub fn update_recording_progress(&self, state: SessionState, elapsed_secs: u64, max_secs: u64) {
        let label = match state {
            SessionState::Paused => "Paused   ".yellow(),
            _ => "Recording".red(),
        };
        if let Some(spinner) = &self.spinner {
            spinner.set_message(format!(
                "{} {}",
                label,
                self.format_progress(elapsed_secs, max_secs)
            ));
        }
    }

    /// Print a diary entry
    pub fn diary_entry(&self, record: &DiaryRecord) {
        self.key_value("date", &record.date.to_string());
        if let Some(id) = record.id {
            self.key_value("id", &id.to_string());
        }
        self.key_value("emotion", &emotion_display(record.emotion));
        self.key_value(
            "audio",
            record.audio_path.as_deref().unwrap_or("(none)"),
        );
        if let Some(comment) = record.comment.as_deref().filter(|c| !c.is_empty()) {
            self.key_value("comment", comment);
        }
        if !record.content.is_empty() {
            println!();
            self.output(&record.content);
        }
    }

    /// Print one line per diary entry
    pub fn diary_list(&self, records: &[DiaryRecord]) {
        for record in records {
            let marker = if record.has_audio() { "♪" } else { " " };
            let state = if record.is_finalized() {
                "final".green()
            } else {
                "draft".yellow()
            };
            println!(
                "{} {} {} {}",
                record.date.to_string().cyan(),
                marker,
                state,
                preview(&record.content, 48)
            );
        }
    }

    pub fn day(&self, day: &Day) {
        self.key_value("date", &day.date.to_string());
        self.key_value("emotion", &emotion_display(day.emotion));
    }

    /// Print the emotion counts, one bar per emotion
    pub fn emotion_tally(&self, tally: &EmotionTally) {
        let total = tally.total();
        for (emotion, count) in tally.iter() {
            let width = if total > 0 {
                (count as usize * 30) / total as usize
            } else {
                0
            };
            println!(
                "{:>8} {:>4} {}",
                emotion.as_str(),
                count,
                "█".repeat(width).cyan()
            );
        }
        if let Some(dominant) = tally.dominant() {
            self.key_value("most frequent", &emotion_display(Some(dominant)));
        }
    }

    pub fn yearly_statistics(&self, stats: &YearlyStatistics) {
        self.key_value("year", &stats.year.to_string());
        self.key_value("diaries", &stats.total_diaries.to_string());
        println!();
        self.emotion_tally(&stats.tally);
        println!();
        for month in 1..=12u32 {
            if let Some(days) = stats.month(month) {
                println!("{:>2} {}", month, calendar_row(days));
            }
        }
    }

    pub fn monthly_statistics(&self, stats: &MonthlyStatistics) {
        self.key_value("month", &format!("{}-{:02}", stats.year, stats.month));
        self.key_value("days", &stats.total_days.to_string());
        println!();
        self.emotion_tally(&stats.tally);
        println!();
        println!("   {}", calendar_row(&stats.daily));
    }

    pub fn user_profile(&self, user: &UserProfile) {
        self.key_value("email", &user.email);
        if let Some(nickname) = &user.nickname {
            self.key_value("nickname", nickname);
        }
        if let Some(gender) = user.gender {
            self.key_value("gender", gender.as_str());
        }
        if let Some(age_group) = user.age_group {
            self.key_value("age group", age_group.label());
        }
    }

    /// One line per item, then the day's completion rate
    pub fn todo_list(&self, items: &[&TodoItem], rate: u8) {
        for item in items {
            let check = if item.done { "[x]".green() } else { "[ ]".normal() };
            let id = format!("{:>4}", format!("#{}", item.id));
            println!("{} {} {}", id.dimmed(), check, item.text);
        }
        println!();
        self.key_value("done", &format!("{}%", rate));
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

fn clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn emotion_display(emotion: Option<Emotion>) -> String {
    match emotion {
        Some(e) => format!("{} ({})", e.as_str(), e.label()),
        None => "(none)".to_string(),
    }
}

fn emotion_glyph(emotion: Option<Emotion>) -> ColoredString {
    match emotion {
        Some(Emotion::Joy) => "●".yellow(),
        Some(Emotion::Sadness) => "●".blue(),
        Some(Emotion::Anger) => "●".red(),
        Some(Emotion::Tired) => "●".magenta(),
        Some(Emotion::Neutral) => "●".white(),
        None => "·".dimmed(),
    }
}

fn calendar_row(days: &[Option<Emotion>]) -> String {
    days.iter()
        .map(|e| emotion_glyph(*e).to_string())
        .collect::<Vec<_>>()
        .join("")
}

/// First line of `text`, cut to `max` characters
fn preview(text: &str, max: usize) -> String {
    let line = text.lines().next().unwrap_or("");
    if line.chars().count() > max {
        let cut: String = line.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    } else {
        line.to_string()
    }
}
