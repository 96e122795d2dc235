//! Where the to-do list is kept

use std::path::PathBuf;

use async_trait::async_trait;

use crate::domain::error::TodoError;
use crate::domain::todo::TodoList;

/// Port for the persisted to-do list
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Read the stored list; a missing file yields an empty list
    async fn load(&self) -> Result<TodoList, TodoError>;

    /// Replace the stored list
    async fn save(&self, list: &TodoList) -> Result<(), TodoError>;

    fn path(&self) -> PathBuf;
}
