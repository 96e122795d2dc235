//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::account::Gender;
use crate::domain::config::ConfigKey;
use crate::domain::diary::{DiaryDate, Emotion};
use crate::domain::recording::Duration;

/// Memento - voice diary recorder and client
#[derive(Parser, Debug)]
#[command(name = "memento")]
#[command(version)]
#[command(about = "Record voice diaries and manage them on a Memento backend")]
#[command(long_about = None)]
pub struct Cli {
    /// Diary backend base URL
    #[arg(long, global = true, value_name = "URL")]
    pub server_url: Option<String>,

    /// Show desktop notifications
    #[arg(short = 'n', long, global = true)]
    pub notify: bool,

    /// Enable debug logging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record a voice diary interactively
    Record(RecordArgs),

    /// Play a recording until it finishes
    Play {
        /// Audio file to play
        file: PathBuf,
    },

    /// Read and write diary entries
    Diary {
        #[command(subcommand)]
        action: DiaryAction,
    },

    /// Set the emotion of a day
    Emotion {
        /// Day to update (yyyy-MM-dd)
        date: DiaryDate,
        /// One of: joy, sadness, anger, tired, neutral
        emotion: Emotion,
    },

    /// Show emotion statistics
    Stats {
        #[command(subcommand)]
        action: StatsAction,
    },

    /// Log in and store the access token in the config file
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = "MEMENTO_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create a backend account
    Signup {
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = "MEMENTO_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        nickname: String,
        /// male or female
        #[arg(long)]
        gender: Gender,
        /// Age in years; only its decade is sent
        #[arg(long)]
        age: u32,
    },

    /// Show the logged-in user
    Whoami,

    /// Change the account password
    Password {
        #[arg(long, value_name = "PASSWORD")]
        current: String,
        #[arg(long, value_name = "PASSWORD")]
        new: String,
    },

    /// Keep a to-do list per day
    Todo {
        #[command(subcommand)]
        action: TodoAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Options for an interactive recording session
#[derive(clap::Args, Debug, Clone)]
pub struct RecordArgs {
    /// Diary date the recording belongs to (default: today)
    #[arg(short, long, value_name = "DATE")]
    pub date: Option<DiaryDate>,

    /// Backend id of the diary entry, used to name the stored file
    #[arg(long, value_name = "ID")]
    pub diary_id: Option<i64>,

    /// Stop automatically after this long (e.g., 90s, 5m, 4m30s)
    #[arg(short = 'm', long, value_name = "TIME")]
    pub max_duration: Option<Duration>,

    /// Save the recording as a diary draft afterwards
    #[arg(long, conflicts_with = "finalize")]
    pub save: bool,

    /// Finalize the diary with the recording afterwards
    #[arg(long)]
    pub finalize: bool,

    /// Text content sent along with the recording
    #[arg(short, long, value_name = "TEXT", default_value = "")]
    pub content: String,
}

/// Diary subcommands
#[derive(Subcommand, Debug)]
pub enum DiaryAction {
    /// Show the entry of a date
    Show {
        /// Entry date (default: today)
        date: Option<DiaryDate>,
    },
    /// List all entries
    List,
    /// Save a draft entry
    Save {
        date: DiaryDate,
        /// Entry text
        #[arg(short, long, default_value = "")]
        content: String,
        /// Recording to attach
        #[arg(short, long, value_name = "FILE")]
        audio: Option<PathBuf>,
    },
    /// Finalize an entry; the backend assigns emotion and comment
    Finalize {
        date: DiaryDate,
        #[arg(short, long, default_value = "")]
        content: String,
        #[arg(short, long, value_name = "FILE")]
        audio: Option<PathBuf>,
    },
    /// Download the audio of an entry into the cache
    Audio {
        date: DiaryDate,
        /// Play it after downloading
        #[arg(long)]
        play: bool,
    },
}

/// Statistics subcommands
#[derive(Subcommand, Debug, Clone, Copy)]
pub enum StatsAction {
    /// Emotion counts and calendar for a year
    Year { year: i32 },
    /// Emotion counts and days of one month
    Month { year: i32, month: u32 },
}

/// To-do subcommands; the list lives in a local file
#[derive(Subcommand, Debug)]
pub enum TodoAction {
    /// Add an item
    Add {
        text: String,
        /// Day the item belongs to (default: today)
        #[arg(short, long, value_name = "DATE")]
        date: Option<DiaryDate>,
    },
    /// Show the items of a day with the completion rate
    List {
        #[arg(short, long, value_name = "DATE")]
        date: Option<DiaryDate>,
    },
    /// Mark an item done, or not done again
    Done { id: u32 },
    /// Replace an item's text
    Edit { id: u32, text: String },
    /// Delete an item
    Rm { id: u32 },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create a default config file
    Init,
    /// Validate and store one value
    Set {
        /// server_url, access_token, cache_dir, max_duration or notify
        key: ConfigKey,
        value: String,
    },
    /// Print one stored value
    Get { key: ConfigKey },
    /// Print every key, token masked
    List,
    /// Print where the config file lives
    Path,
}
