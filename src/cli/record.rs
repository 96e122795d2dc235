//! Interactive recording session

use std::process::ExitCode;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use crate::application::ports::{AudioCapture, FileStorage, Notifier};
use crate::application::{RecordingConfig, RecordingError, RecordingSessionManager};
use crate::domain::config::AppConfig;
use crate::domain::diary::{DiaryDate, DiaryId};
use crate::domain::recording::SessionState;
use crate::infrastructure::{create_capture, create_notifier, FsStorage};

use super::app::{diary_service, EXIT_ERROR, EXIT_INTERRUPTED};
use super::args::RecordArgs;
use super::presenter::Presenter;
use super::signals::ShutdownSignal;

const KEY_HELP: &str = "[p] pause  [r] resume  [s] stop  [q] discard, then Enter";

/// Keyboard commands accepted while recording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Pause,
    Resume,
    Stop,
    Discard,
}

impl Key {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_lowercase().as_str() {
            "p" | "pause" => Some(Self::Pause),
            "r" | "resume" => Some(Self::Resume),
            "s" | "stop" => Some(Self::Stop),
            "q" | "quit" | "discard" => Some(Self::Discard),
            _ => None,
        }
    }
}

/// How the interactive loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Stopped by the user or the duration limit; the file is ready to commit
    Stopped { limit_reached: bool },
    /// The user discarded the recording
    Discarded,
    /// Ctrl+C or SIGTERM
    Interrupted,
    /// The manager tore the session down after a failure it already reported
    Failed,
}

/// Run `memento record`
pub async fn run_record(args: RecordArgs, config: &AppConfig) -> ExitCode {
    let mut presenter = Presenter::new();

    let shutdown = ShutdownSignal::new();
    if let Err(e) = shutdown.setup() {
        presenter.error(&format!("Failed to setup signal handler: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }

    let date = args.date.unwrap_or_else(DiaryDate::today);
    let notify = config.notify_or_default();
    let recording_config = RecordingConfig {
        max_duration: args
            .max_duration
            .unwrap_or_else(|| config.max_duration_or_default()),
        cache_dir: config.cache_dir_or_default(),
        enable_notify: notify,
    };
    let max_secs = recording_config.max_duration.as_secs();
    let manager = RecordingSessionManager::new(
        create_capture(),
        FsStorage::new(),
        create_notifier(notify),
        recording_config,
    );

    if manager.start(date).await.is_err() {
        // Already reported through the notifier
        return ExitCode::from(EXIT_ERROR);
    }

    presenter.info(&format!("Recording diary for {}. {}", date, KEY_HELP));
    presenter.start_spinner("");
    presenter.update_recording_progress(SessionState::Recording, 0, max_secs);

    let stdin = BufReader::new(tokio::io::stdin()).lines();
    let outcome = drive(&manager, stdin, &shutdown, &presenter, max_secs).await;
    debug!(?outcome, "recording loop finished");

    match outcome {
        Outcome::Stopped { limit_reached } => {
            let elapsed = manager.elapsed_seconds();
            let message = format!("Recorded {:02}:{:02}", elapsed / 60, elapsed % 60);
            if limit_reached {
                presenter.spinner_success(&format!("{} (time limit)", message));
            } else {
                presenter.spinner_success(&message);
            }
            finish_recording(&manager, &args, date, config, &mut presenter).await
        }
        Outcome::Discarded => {
            manager.reset().await;
            presenter.stop_spinner();
            presenter.warn("Recording discarded");
            ExitCode::SUCCESS
        }
        Outcome::Interrupted => {
            manager.reset().await;
            presenter.stop_spinner();
            presenter.warn("Interrupted, recording discarded");
            ExitCode::from(EXIT_INTERRUPTED)
        }
        Outcome::Failed => {
            manager.reset().await;
            presenter.spinner_fail("Recording aborted");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Feed keyboard commands, status changes and shutdown into the manager
/// until the session leaves its active states.
pub async fn drive<C, S, N, R>(
    manager: &RecordingSessionManager<C, S, N>,
    mut input: tokio::io::Lines<R>,
    shutdown: &ShutdownSignal,
    presenter: &Presenter,
    max_secs: u64,
) -> Outcome
where
    C: AudioCapture + 'static,
    S: FileStorage + 'static,
    N: Notifier + 'static,
    R: tokio::io::AsyncBufRead + Unpin,
{
    let mut status = manager.subscribe();
    let mut input_open = true;

    loop {
        tokio::select! {
            _ = shutdown.recv() => return Outcome::Interrupted,

            changed = status.changed() => {
                if changed.is_err() {
                    return Outcome::Failed;
                }
                let current = *status.borrow_and_update();
                match current.state {
                    SessionState::Stopped => {
                        return Outcome::Stopped { limit_reached: current.limit_reached };
                    }
                    SessionState::Idle => return Outcome::Failed,
                    state => {
                        presenter.update_recording_progress(state, current.elapsed_seconds, max_secs)
                    }
                }
            }

            line = input.next_line(), if input_open => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        // Non-interactive stdin; run until the limit or a signal
                        input_open = false;
                        continue;
                    }
                    Err(e) => {
                        warn!(error = %e, "stdin unreadable, ignoring keyboard input");
                        input_open = false;
                        continue;
                    }
                };

                let result = match Key::parse(&line) {
                    Some(Key::Pause) => manager.pause().await,
                    Some(Key::Resume) => manager.resume().await,
                    Some(Key::Stop) => match manager.stop().await {
                        Ok(_) => return Outcome::Stopped { limit_reached: false },
                        Err(e) => Err(e),
                    },
                    Some(Key::Discard) => return Outcome::Discarded,
                    None => {
                        if !line.trim().is_empty() {
                            presenter.warn(&format!("Unknown command '{}'. {}", line.trim(), KEY_HELP));
                        }
                        Ok(())
                    }
                };

                match result {
                    Ok(()) => {}
                    Err(RecordingError::InvalidState(e)) => presenter.warn(&e.to_string()),
                    Err(e) => {
                        debug!(error = %e, "recording command failed");
                        return Outcome::Failed;
                    }
                }
            }
        }
    }
}

/// Commit the stopped recording, then hand it to the backend if asked
async fn finish_recording<C, S, N>(
    manager: &RecordingSessionManager<C, S, N>,
    args: &RecordArgs,
    date: DiaryDate,
    config: &AppConfig,
    presenter: &mut Presenter,
) -> ExitCode
where
    C: AudioCapture + 'static,
    S: FileStorage + 'static,
    N: Notifier + 'static,
{
    let path = match manager.commit(args.diary_id.map(DiaryId::new)).await {
        Ok(path) => path,
        Err(e) => {
            debug!(error = %e, "commit failed");
            return ExitCode::from(EXIT_ERROR);
        }
    };
    presenter.success(&format!("Saved recording to {}", path.display()));
    presenter.output(&path.to_string_lossy());

    if !(args.save || args.finalize) {
        return ExitCode::SUCCESS;
    }

    let service = diary_service(config);
    if args.finalize {
        presenter.start_spinner("Finalizing diary...");
        match service.finalize(date, &args.content, Some(&path)).await {
            Ok(record) => {
                presenter.spinner_success(&format!("Diary finalized for {}", date));
                presenter.diary_entry(&record);
                ExitCode::SUCCESS
            }
            Err(e) => {
                presenter.spinner_fail("Finalize failed");
                presenter.error(&e.to_string());
                presenter.info(&format!(
                    "Retry with: memento diary finalize {} --audio {}",
                    date,
                    path.display()
                ));
                ExitCode::from(EXIT_ERROR)
            }
        }
    } else {
        presenter.start_spinner("Saving diary...");
        match service.save_voice(date, &args.content, &path).await {
            Ok(_) => {
                presenter.spinner_success(&format!("Draft saved for {}", date));
                ExitCode::SUCCESS
            }
            Err(e) => {
                presenter.spinner_fail("Save failed");
                presenter.error(&e.to_string());
                ExitCode::from(EXIT_ERROR)
            }
        }
    }
}
