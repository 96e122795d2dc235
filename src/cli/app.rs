//! Command handlers

use std::env;
use std::path::Path;
use std::process::ExitCode;

use tracing::debug;

use crate::application::ports::ConfigStore;
use crate::application::{
    DiaryService, PlaybackController, PlaybackState, StatisticsError, StatisticsService,
};
use crate::domain::account::{AgeGroup, Gender, Signup};
use crate::domain::config::AppConfig;
use crate::domain::diary::{DiaryDate, Emotion};
use crate::infrastructure::{FsStorage, HttpDiaryClient, RodioPlayback, XdgConfigStore};

use super::args::{DiaryAction, StatsAction};
use super::presenter::Presenter;
use super::signals::ShutdownSignal;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;
/// Conventional 128 + SIGINT
pub const EXIT_INTERRUPTED: u8 = 130;

/// Environment variable overriding `server_url`
pub const ENV_SERVER_URL: &str = "MEMENTO_SERVER_URL";
/// Environment variable overriding `access_token`
pub const ENV_ACCESS_TOKEN: &str = "MEMENTO_ACCESS_TOKEN";

/// Load config with precedence: defaults < file < env < cli
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = match store.load().await {
        Ok(config) => config,
        Err(e) => {
            debug!(error = %e, "ignoring unreadable config file");
            AppConfig::empty()
        }
    };

    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config())
        .merge(cli_config)
}

fn env_config() -> AppConfig {
    AppConfig {
        server_url: env::var(ENV_SERVER_URL).ok().filter(|s| !s.is_empty()),
        access_token: env::var(ENV_ACCESS_TOKEN).ok().filter(|s| !s.is_empty()),
        ..Default::default()
    }
}

/// HTTP client for the configured backend
pub fn diary_client(config: &AppConfig) -> HttpDiaryClient {
    let client = HttpDiaryClient::new(config.server_url_or_default());
    match config.access_token.as_deref().filter(|t| !t.is_empty()) {
        Some(token) => client.with_access_token(token),
        None => client,
    }
}

pub fn diary_service(config: &AppConfig) -> DiaryService<HttpDiaryClient, FsStorage> {
    DiaryService::new(
        diary_client(config),
        FsStorage::new(),
        config.cache_dir_or_default(),
    )
}

/// Play a file until it finishes or the user interrupts
pub async fn run_play(path: &Path) -> ExitCode {
    let presenter = Presenter::new();
    match play_to_end(path, &presenter).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_INTERRUPTED),
        Err(message) => {
            presenter.error(&message);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Returns `Ok(false)` when interrupted before the end
async fn play_to_end(path: &Path, presenter: &Presenter) -> Result<bool, String> {
    if !path.is_file() {
        return Err(format!("File not found: {}", path.display()));
    }

    let shutdown = ShutdownSignal::new();
    shutdown
        .setup()
        .map_err(|e| format!("Failed to setup signal handler: {}", e))?;

    let controller = PlaybackController::new(RodioPlayback::new());
    controller.load(path).await.map_err(|e| e.to_string())?;
    controller.play().await.map_err(|e| e.to_string())?;
    presenter.info(&format!("Playing {}", path.display()));

    let mut state = controller.subscribe();
    tokio::select! {
        _ = state.wait_for(|s| *s == PlaybackState::Unloaded) => {
            presenter.success("Playback finished");
            Ok(true)
        }
        _ = shutdown.recv() => {
            controller.unload().await;
            presenter.warn("Playback stopped");
            Ok(false)
        }
    }
}

/// Handle diary subcommand
pub async fn run_diary(action: DiaryAction, config: &AppConfig) -> ExitCode {
    let mut presenter = Presenter::new();
    let service = diary_service(config);

    let result = match action {
        DiaryAction::Show { date } => {
            let date = date.unwrap_or_else(DiaryDate::today);
            match service.load(date).await {
                Ok(Some(record)) => {
                    presenter.diary_entry(&record);
                    Ok(())
                }
                Ok(None) => {
                    presenter.info(&format!("No diary entry for {}", date));
                    Ok(())
                }
                Err(e) => Err(e.to_string()),
            }
        }
        DiaryAction::List => match service.list().await {
            Ok(records) if records.is_empty() => {
                presenter.info("No diary entries yet");
                Ok(())
            }
            Ok(mut records) => {
                records.sort_by_key(|r| r.date);
                presenter.diary_list(&records);
                Ok(())
            }
            Err(e) => Err(e.to_string()),
        },
        DiaryAction::Save {
            date,
            content,
            audio,
        } => {
            presenter.start_spinner("Saving diary...");
            let saved = match audio.as_deref() {
                Some(path) => service.save_voice(date, &content, path).await,
                None => service.save_text(date, &content).await,
            };
            match saved {
                Ok(_) => {
                    presenter.spinner_success(&format!("Draft saved for {}", date));
                    Ok(())
                }
                Err(e) => {
                    presenter.spinner_fail("Save failed");
                    Err(e.to_string())
                }
            }
        }
        DiaryAction::Finalize {
            date,
            content,
            audio,
        } => {
            presenter.start_spinner("Finalizing diary...");
            match service.finalize(date, &content, audio.as_deref()).await {
                Ok(record) => {
                    presenter.spinner_success(&format!("Diary finalized for {}", date));
                    presenter.diary_entry(&record);
                    Ok(())
                }
                Err(e) => {
                    presenter.spinner_fail("Finalize failed");
                    Err(e.to_string())
                }
            }
        }
        DiaryAction::Audio { date, play } => {
            download_audio(&service, date, play, &mut presenter).await
        }
    };

    finish(result, &presenter)
}

async fn download_audio(
    service: &DiaryService<HttpDiaryClient, FsStorage>,
    date: DiaryDate,
    play: bool,
    presenter: &mut Presenter,
) -> Result<(), String> {
    let record = service
        .load(date)
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("No diary entry for {}", date))?;

    presenter.start_spinner("Downloading audio...");
    let path = match service.download_audio(&record).await {
        Ok(Some(path)) => {
            presenter.spinner_success("Audio downloaded");
            path
        }
        Ok(None) => {
            presenter.stop_spinner();
            presenter.warn(&format!("No playable audio stored for {}", date));
            return Ok(());
        }
        Err(e) => {
            presenter.spinner_fail("Download failed");
            return Err(e.to_string());
        }
    };

    presenter.output(&path.to_string_lossy());
    if play {
        play_to_end(&path, presenter).await?;
    }
    Ok(())
}

/// Handle emotion subcommand
pub async fn run_emotion(date: DiaryDate, emotion: Emotion, config: &AppConfig) -> ExitCode {
    let presenter = Presenter::new();
    let result = diary_service(config)
        .set_emotion(date, emotion)
        .await
        .map(|day| presenter.day(&day))
        .map_err(|e| e.to_string());
    finish(result, &presenter)
}

/// Handle stats subcommand
pub async fn run_stats(action: StatsAction, config: &AppConfig) -> ExitCode {
    let presenter = Presenter::new();
    let service = StatisticsService::new(diary_client(config));

    let result = match action {
        StatsAction::Year { year } => service
            .yearly(year)
            .await
            .map(|stats| presenter.yearly_statistics(&stats)),
        StatsAction::Month { year, month } => service
            .monthly(year, month)
            .await
            .map(|stats| presenter.monthly_statistics(&stats)),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ StatisticsError::InvalidMonth(_)) => {
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_USAGE_ERROR)
        }
        Err(e) => {
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Log in and persist the token to the config file
pub async fn run_login(email: &str, password: &str, config: &AppConfig) -> ExitCode {
    let mut presenter = Presenter::new();
    let store = XdgConfigStore::new();

    presenter.start_spinner("Logging in...");
    let token = match diary_service(config).login(email, password).await {
        Ok(token) => token,
        Err(e) => {
            presenter.spinner_fail("Login failed");
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let saved = async {
        let mut file_config = store.load().await?;
        file_config.access_token = Some(token);
        store.save(&file_config).await
    }
    .await;

    match saved {
        Ok(()) => {
            presenter.spinner_success(&format!("Logged in as {}", email));
            if env::var(ENV_ACCESS_TOKEN).is_ok_and(|t| !t.is_empty()) {
                presenter.warn(&format!(
                    "{} is set and overrides the stored token",
                    ENV_ACCESS_TOKEN
                ));
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            presenter.spinner_fail("Could not store the access token");
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Register an account; the token still comes from `memento login`
pub async fn run_signup(signup: Signup, config: &AppConfig) -> ExitCode {
    let mut presenter = Presenter::new();
    presenter.start_spinner("Creating account...");
    match diary_service(config).signup(&signup).await {
        Ok(()) => {
            presenter.spinner_success(&format!("Account created for {}", signup.email));
            presenter.info("Run 'memento login' to sign in");
            ExitCode::SUCCESS
        }
        Err(e) => {
            presenter.spinner_fail("Sign-up failed");
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Form fields as typed on the command line
pub fn signup_form(
    email: String,
    password: String,
    nickname: String,
    gender: Gender,
    age: u32,
) -> Signup {
    Signup {
        email,
        password,
        nickname,
        gender,
        age_group: AgeGroup::from_age(age),
    }
}

pub async fn run_whoami(config: &AppConfig) -> ExitCode {
    let presenter = Presenter::new();
    let result = diary_service(config)
        .whoami()
        .await
        .map(|user| presenter.user_profile(&user))
        .map_err(|e| e.to_string());
    finish(result, &presenter)
}

pub async fn run_password(current: &str, new: &str, config: &AppConfig) -> ExitCode {
    let presenter = Presenter::new();
    let result = diary_service(config)
        .change_password(current, new)
        .await
        .map(|()| presenter.success("Password changed"))
        .map_err(|e| e.to_string());
    finish(result, &presenter)
}

fn finish(result: Result<(), String>, presenter: &Presenter) -> ExitCode {
    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(message) => {
            presenter.error(&message);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diary_client_uses_configured_url() {
        let config = AppConfig {
            server_url: Some("https://diary.example.com/".to_string()),
            ..Default::default()
        };
        assert_eq!(diary_client(&config).base_url(), "https://diary.example.com");
    }

    #[test]
    fn diary_client_defaults_url() {
        assert_eq!(
            diary_client(&AppConfig::empty()).base_url(),
            crate::domain::config::DEFAULT_SERVER_URL
        );
    }

    #[test]
    fn signup_form_sends_age_group() {
        let form = signup_form(
            "me@example.com".to_string(),
            "pw".to_string(),
            "메멘토".to_string(),
            Gender::Male,
            45,
        );
        assert_eq!(form.age_group, AgeGroup::Forties);
    }

    #[tokio::test]
    async fn play_missing_file_fails_before_touching_audio() {
        let result = play_to_end(Path::new("/nonexistent/voice_1.wav"), &Presenter::new()).await;
        assert!(result.unwrap_err().contains("File not found"));
    }
}
