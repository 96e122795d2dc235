//! To-do list storage adapters

mod json;

pub use json::JsonTodoStore;
