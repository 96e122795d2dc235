//! The `memento` command line

pub mod app;
pub mod args;
pub mod config_cmd;
pub mod presenter;
pub mod record;
pub mod signals;
pub mod todo_cmd;

pub use app::{load_merged_config, EXIT_ERROR, EXIT_INTERRUPTED, EXIT_SUCCESS, EXIT_USAGE_ERROR};
pub use args::{Cli, Commands, ConfigAction, DiaryAction, RecordArgs, StatsAction, TodoAction};
pub use presenter::Presenter;
pub use record::run_record;
