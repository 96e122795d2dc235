//! Daily to-do list

use serde::{Deserialize, Serialize};

use crate::domain::diary::DiaryDate;
use crate::domain::error::TodoError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: u32,
    pub date: DiaryDate,
    pub text: String,
    #[serde(default)]
    pub done: bool,
}

/// Every to-do item across all days.
///
/// Ids are never reused, so a removed item's id cannot come back and
/// point at something else.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoList {
    #[serde(default)]
    next_id: u32,
    #[serde(default)]
    items: Vec<TodoItem>,
}

impl TodoList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append an item for `date`, returning it with its new id
    pub fn add(&mut self, date: DiaryDate, text: &str) -> Result<&TodoItem, TodoError> {
        let text = checked_text(text)?;
        // Lists written by hand may lack next_id
        let id = self
            .next_id
            .max(self.items.iter().map(|t| t.id).max().unwrap_or(0))
            + 1;
        self.next_id = id;
        self.items.push(TodoItem {
            id,
            date,
            text,
            done: false,
        });
        Ok(&self.items[self.items.len() - 1])
    }

    /// Flip completion, returning the new state
    pub fn toggle(&mut self, id: u32) -> Result<bool, TodoError> {
        let item = self.item_mut(id)?;
        item.done = !item.done;
        Ok(item.done)
    }

    pub fn edit(&mut self, id: u32, text: &str) -> Result<(), TodoError> {
        let text = checked_text(text)?;
        self.item_mut(id)?.text = text;
        Ok(())
    }

    pub fn remove(&mut self, id: u32) -> Result<TodoItem, TodoError> {
        let index = self
            .items
            .iter()
            .position(|t| t.id == id)
            .ok_or(TodoError::NotFound(id))?;
        Ok(self.items.remove(index))
    }

    /// Items of one day in insertion order
    pub fn on(&self, date: DiaryDate) -> impl Iterator<Item = &TodoItem> {
        self.items.iter().filter(move |t| t.date == date)
    }

    /// Percentage of the day's items that are done, rounded; 0 for an empty day
    pub fn completion_rate(&self, date: DiaryDate) -> u8 {
        let (total, done) = self.on(date).fold((0u32, 0u32), |(total, done), t| {
            (total + 1, done + u32::from(t.done))
        });
        if total == 0 {
            return 0;
        }
        ((done * 100 + total / 2) / total) as u8
    }

    fn item_mut(&mut self, id: u32) -> Result<&mut TodoItem, TodoError> {
        self.items
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(TodoError::NotFound(id))
    }
}

fn checked_text(text: &str) -> Result<String, TodoError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(TodoError::EmptyText);
    }
    Ok(text.to_string())
}
