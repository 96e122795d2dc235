//! `memento config ...`

use crate::application::ports::ConfigStore;
use crate::domain::config::{AppConfig, ConfigKey};
use crate::domain::error::ConfigError;

use super::args::ConfigAction;
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Run one config action against the file store only; env and flags are not merged in
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => {
            store.init().await?;
            presenter.success(&format!("Created {}", store.path().display()));
        }
        ConfigAction::Set { key, value } => {
            let mut config = store.load().await?;
            key.set(&mut config, &value)?;
            store.save(&config).await?;
            presenter.success(&format!("{} = {}", key, shown(&config, key)));
        }
        ConfigAction::Get { key } => presenter.output(&shown(&store.load().await?, key)),
        ConfigAction::List => {
            let config = store.load().await?;
            ConfigKey::ALL
                .into_iter()
                .for_each(|key| presenter.key_value(key.name(), &shown(&config, key)));
        }
        ConfigAction::Path => presenter.output(&store.path().to_string_lossy()),
    }
    Ok(())
}

fn shown(config: &AppConfig, key: ConfigKey) -> String {
    match key.get(config) {
        Some(value) if key.is_secret() => mask_token(&value),
        Some(value) => value,
        None => NOT_SET.to_string(),
    }
}

/// Keeps four characters at each end of long tokens
fn mask_token(token: &str) -> String {
    let count = token.chars().count();
    if count <= 8 {
        return "*".repeat(count);
    }
    let head: String = token.chars().take(4).collect();
    let tail: String = token.chars().skip(count - 4).collect();
    format!("{}...{}", head, tail)
}
