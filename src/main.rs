//! `memento` binary

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use memento::cli::{
    app::{self, load_merged_config, EXIT_ERROR},
    args::{Cli, Commands, ConfigAction, TodoAction},
    config_cmd::handle_config_command,
    presenter::Presenter,
    run_record,
    todo_cmd::handle_todo_command,
};
use memento::domain::config::AppConfig;
use memento::infrastructure::{JsonTodoStore, XdgConfigStore};

fn init_tracing(verbose: bool) {
    let default = if verbose { "memento=debug" } else { "memento=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// `config` edits the file itself, so it never sees env or flag overrides
async fn run_config(action: ConfigAction) -> ExitCode {
    let presenter = Presenter::new();
    match handle_config_command(action, &XdgConfigStore::new(), &presenter).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// The to-do list is local only and needs no backend config
async fn run_todo(action: TodoAction) -> ExitCode {
    let presenter = Presenter::new();
    match handle_todo_command(action, &JsonTodoStore::new(), &presenter).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let flags = AppConfig {
        server_url: cli.server_url,
        notify: cli.notify.then_some(true),
        ..AppConfig::empty()
    };
    let config = load_merged_config(flags).await;

    match cli.command {
        Commands::Config { action } => run_config(action).await,
        Commands::Record(args) => run_record(args, &config).await,
        Commands::Play { file } => app::run_play(&file).await,
        Commands::Diary { action } => app::run_diary(action, &config).await,
        Commands::Emotion { date, emotion } => app::run_emotion(date, emotion, &config).await,
        Commands::Stats { action } => app::run_stats(action, &config).await,
        Commands::Login { email, password } => app::run_login(&email, &password, &config).await,
        Commands::Signup {
            email,
            password,
            nickname,
            gender,
            age,
        } => {
            let form = app::signup_form(email, password, nickname, gender, age);
            app::run_signup(form, &config).await
        }
        Commands::Whoami => app::run_whoami(&config).await,
        Commands::Password { current, new } => app::run_password(&current, &new, &config).await,
        Commands::Todo { action } => run_todo(action).await,
    }
}
