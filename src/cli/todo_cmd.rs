//! `memento todo ...`

use crate::application::ports::TodoStore;
use crate::domain::diary::DiaryDate;
use crate::domain::error::TodoError;

use super::args::TodoAction;
use super::presenter::Presenter;

/// Apply one action; the list is saved only when it changed
pub async fn handle_todo_command<S: TodoStore>(
    action: TodoAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), TodoError> {
    let mut list = store.load().await?;

    match action {
        TodoAction::List { date } => {
            let date = date.unwrap_or_else(DiaryDate::today);
            let items: Vec<_> = list.on(date).collect();
            if items.is_empty() {
                presenter.info(&format!("Nothing to do on {}", date));
            } else {
                presenter.todo_list(&items, list.completion_rate(date));
            }
            return Ok(());
        }
        TodoAction::Add { text, date } => {
            let item = list.add(date.unwrap_or_else(DiaryDate::today), &text)?;
            presenter.success(&format!("Added #{} for {}", item.id, item.date));
        }
        TodoAction::Done { id } => {
            let state = if list.toggle(id)? { "done" } else { "not done" };
            presenter.success(&format!("#{} marked {}", id, state));
        }
        TodoAction::Edit { id, text } => {
            list.edit(id, &text)?;
            presenter.success(&format!("#{} updated", id));
        }
        TodoAction::Rm { id } => {
            let item = list.remove(id)?;
            presenter.success(&format!("Removed #{} {}", item.id, item.text));
        }
    }

    store.save(&list).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::JsonTodoStore;
    use tempfile::TempDir;

    fn date() -> DiaryDate {
        DiaryDate::from_ymd(2024, 5, 17).unwrap()
    }

    fn add(text: &str) -> TodoAction {
        TodoAction::Add {
            text: text.to_string(),
            date: Some(date()),
        }
    }

    #[tokio::test]
    async fn actions_persist_between_runs() {
        let dir = TempDir::new().unwrap();
        let store = JsonTodoStore::with_path(dir.path().join("todos.json"));
        let presenter = Presenter::new();

        for action in [
            add("산책하기"),
            add("일기 쓰기"),
            TodoAction::Done { id: 1 },
            TodoAction::Edit {
                id: 2,
                text: "음성 일기 쓰기".to_string(),
            },
        ] {
            handle_todo_command(action, &store, &presenter).await.unwrap();
        }

        let list = store.load().await.unwrap();
        let items: Vec<_> = list.on(date()).collect();
        assert_eq!(items.len(), 2);
        assert!(items[0].done);
        assert_eq!(items[1].text, "음성 일기 쓰기");
        assert_eq!(list.completion_rate(date()), 50);
    }

    #[tokio::test]
    async fn failed_edit_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let store = JsonTodoStore::with_path(dir.path().join("todos.json"));
        let presenter = Presenter::new();

        let result = handle_todo_command(TodoAction::Rm { id: 4 }, &store, &presenter).await;
        assert_eq!(result, Err(TodoError::NotFound(4)));
        let result = handle_todo_command(add(" "), &store, &presenter).await;
        assert_eq!(result, Err(TodoError::EmptyText));
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn listing_does_not_create_the_file() {
        let dir = TempDir::new().unwrap();
        let store = JsonTodoStore::with_path(dir.path().join("todos.json"));
        handle_todo_command(TodoAction::List { date: Some(date()) }, &store, &Presenter::new())
            .await
            .unwrap();
        assert!(!store.path().exists());
    }
}
