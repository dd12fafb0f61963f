//! Todo and account operations
//!
//! Each operation reloads the full collection, changes it, and saves it back.

use crate::error::{Result, StoreError, ValidationError};
use crate::models::{LoginAttempt, Priority, Status, TodoItem, User};
use crate::store::Store;

/// Input for creating a todo
#[derive(Debug, Clone, Default)]
pub struct NewTodo {
    pub title: String,
    pub details: String,
    pub priority: Priority,
    pub status: Status,
}

/// Field changes for an existing todo; `None` leaves the field alone
#[derive(Debug, Clone, Default)]
pub struct TodoEdit {
    pub title: Option<String>,
    pub details: Option<String>,
    pub priority: Option<Priority>,
}

fn require_non_empty(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Empty(field))
    } else {
        Ok(())
    }
}

/// Keep only `owner`'s items, in stored order
pub fn filter_by_owner(todos: Vec<TodoItem>, owner: &str) -> Vec<TodoItem> {
    todos.into_iter().filter(|t| t.owner == owner).collect()
}

pub fn todos_for_owner(store: &Store, owner: &str) -> Result<Vec<TodoItem>> {
    Ok(filter_by_owner(store.load_todos()?, owner))
}

pub fn find_todo(store: &Store, owner: &str, id: &str) -> Result<TodoItem> {
    store
        .load_todos()?
        .into_iter()
        .find(|t| t.id == id && t.owner == owner)
        .ok_or_else(|| StoreError::NotFound(id.to_string()))
}

pub fn create_todo(store: &Store, owner: &str, new: NewTodo) -> Result<TodoItem> {
    require_non_empty(owner, "owner")?;
    require_non_empty(&new.title, "title")?;

    let mut todos = store.load_todos()?;
    let title = new.title.trim();
    let todo = TodoItem::new(title, new.details, new.priority, owner).with_status(new.status);
    todos.push(todo.clone());
    store.save_todos(&todos)?;

    tracing::info!(id = %todo.id, owner, "Created todo");
    Ok(todo)
}

/// Locate `owner`'s item by id in a fresh load, apply `change`, and save
///
/// `change` returns whether anything needs writing.
fn update_todo<F>(store: &Store, owner: &str, id: &str, change: F) -> Result<TodoItem>
where
    F: FnOnce(&mut TodoItem) -> Result<bool>,
{
    let mut todos = store.load_todos()?;
    let todo = todos
        .iter_mut()
        .find(|t| t.id == id && t.owner == owner)
        .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

    if !change(&mut *todo)? {
        return Ok(todo.clone());
    }
    todo.touch();
    let updated = todo.clone();

    store.save_todos(&todos)?;
    Ok(updated)
}

pub fn edit_todo(store: &Store, owner: &str, id: &str, edit: TodoEdit) -> Result<TodoItem> {
    if let Some(title) = &edit.title {
        require_non_empty(title, "title")?;
    }

    let todo = update_todo(store, owner, id, |todo| {
        if let Some(title) = edit.title {
            todo.title = title.trim().to_string();
        }
        if let Some(details) = edit.details {
            todo.details = details;
        }
        if let Some(priority) = edit.priority {
            todo.priority = priority;
        }
        Ok(true)
    })?;

    tracing::info!(id, owner, "Edited todo");
    Ok(todo)
}

/// Mark as completed; an already completed item is returned untouched
pub fn mark_completed(store: &Store, owner: &str, id: &str) -> Result<TodoItem> {
    update_todo(store, owner, id, |todo| {
        if todo.is_completed() {
            tracing::debug!(id, "Todo already completed");
            return Ok(false);
        }
        todo.status = Status::Completed;
        tracing::info!(id, owner, "Marked todo completed");
        Ok(true)
    })
}

pub fn sign_up(store: &Store, username: &str, password: &str) -> Result<User> {
    require_non_empty(username, "username")?;
    require_non_empty(password, "password")?;

    let mut users = store.load_users()?;
    if users.iter().any(|u| u.username == username) {
        return Err(StoreError::UsernameTaken(username.to_string()));
    }

    let user = User {
        username: username.to_string(),
        password: password.to_string(),
    };
    users.push(user.clone());
    store.save_users(&users)?;

    tracing::info!(username, "Registered user");
    Ok(user)
}

/// Check credentials without touching the login log
pub fn verify_credentials(store: &Store, username: &str, password: &str) -> Result<User> {
    store
        .load_users()?
        .into_iter()
        .find(|u| u.username == username && u.password == password)
        .ok_or(StoreError::InvalidCredentials)
}

/// Log in: check credentials and record the attempt in the login log
pub fn authenticate(store: &Store, username: &str, password: &str) -> Result<User> {
    let result = verify_credentials(store, username, password);
    store.log_login_attempt(username, result.is_ok())?;

    match &result {
        Ok(_) => tracing::debug!(username, "Login succeeded"),
        Err(_) => tracing::warn!(username, "Login failed"),
    }
    result
}

pub fn login_history(store: &Store, username: Option<&str>) -> Result<Vec<LoginAttempt>> {
    let history = store.load_login_history()?;
    Ok(match username {
        Some(name) => history.into_iter().filter(|a| a.username == name).collect(),
        None => history,
    })
}
