//! Memento - voice diary recorder and diary backend client
//!
//! This crate records voice diaries from the microphone, keeps them in a
//! local cache, plays them back, and exchanges diary entries, day emotions
//! and statistics with a Memento backend. It also manages the backend account
//! and keeps a local per-day to-do list.
//!
//! Layers, innermost first:
//!
//! - [`domain`]: recording session state machine, diary records, dates, emotions,
//!   accounts and to-do items
//! - [`application`]: the session manager and diary/statistics services, written against
//!   the traits in [`application::ports`]
//! - [`infrastructure`]: cpal capture, rodio playback, reqwest backend client, tokio-fs
//!   storage, desktop notifications, TOML config, JSON to-do file
//! - [`cli`]: the `memento` binary's argument parsing and command handlers

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
