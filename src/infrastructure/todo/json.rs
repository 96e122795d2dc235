//! To-do list as a JSON file under the XDG data directory

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::application::ports::TodoStore;
use crate::domain::error::TodoError;
use crate::domain::todo::TodoList;
use crate::infrastructure::atomic;

const APP_DIR: &str = "memento";
const FILE_NAME: &str = "todos.json";

/// `$XDG_DATA_HOME/memento/todos.json` (or the platform equivalent)
pub struct JsonTodoStore {
    path: PathBuf,
}

impl JsonTodoStore {
    pub fn new() -> Self {
        Self::with_path(default_location())
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for JsonTodoStore {
    fn default() -> Self {
        Self::new()
    }
}

fn default_location() -> PathBuf {
    let base = dirs::data_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("share")))
        .unwrap_or_default();
    base.join(APP_DIR).join(FILE_NAME)
}

#[async_trait]
impl TodoStore for JsonTodoStore {
    async fn load(&self) -> Result<TodoList, TodoError> {
        let text = match fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no to-do file");
                return Ok(TodoList::new());
            }
            Err(e) => {
                return Err(TodoError::ReadError(format!(
                    "{}: {}",
                    self.path.display(),
                    e
                )))
            }
        };
        serde_json::from_str(&text).map_err(|e| TodoError::ParseError(e.to_string()))
    }

    async fn save(&self, list: &TodoList) -> Result<(), TodoError> {
        let text =
            serde_json::to_vec_pretty(list).map_err(|e| TodoError::WriteError(e.to_string()))?;
        atomic::replace(&self.path, &text)
            .await
            .map_err(|(path, e)| TodoError::WriteError(format!("{}: {}", path.display(), e)))?;
        debug!(path = %self.path.display(), "to-do list saved");
        Ok(())
    }

    fn path(&self) -> PathBuf {
        self.path.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::diary::DiaryDate;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> JsonTodoStore {
        JsonTodoStore::with_path(dir.path().join("memento").join(FILE_NAME))
    }

    #[test]
    fn default_location_ends_in_app_dir() {
        assert!(JsonTodoStore::new().path().ends_with("memento/todos.json"));
    }

    #[tokio::test]
    async fn absent_file_is_empty_list() {
        let dir = TempDir::new().unwrap();
        assert!(store_in(&dir).load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn saved_list_loads_back() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let date = DiaryDate::from_ymd(2024, 5, 17).unwrap();

        let mut list = TodoList::new();
        list.add(date, "물 마시기").unwrap();
        list.toggle(1).unwrap();
        store.save(&list).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, list);
        assert_eq!(loaded.completion_rate(date), 100);
    }

    #[tokio::test]
    async fn corrupt_file_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "[not json").unwrap();

        assert!(matches!(store.load().await, Err(TodoError::ParseError(_))));
    }
}
