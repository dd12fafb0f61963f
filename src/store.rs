//! JSON file store for todos, users and the login log
//!
//! Every load reads the whole file and every save replaces it. Writes go to a
//! temporary file in the target directory which is then renamed over the old
//! one, so readers never see a truncated document.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Result, StoreError, ValidationError};
use crate::models::{LoginAttempt, TodoItem, User};

pub const TODOS_FILE: &str = "todos.json";
pub const USERS_FILE: &str = "users.json";
pub const LOGIN_HISTORY_FILE: &str = "login_history.json";

/// Persistence context: where each collection lives on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Store {
    todos_path: PathBuf,
    users_path: PathBuf,
    login_history_path: PathBuf,
}

impl Store {
    pub fn new(
        todos_path: impl Into<PathBuf>,
        users_path: impl Into<PathBuf>,
        login_history_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            todos_path: todos_path.into(),
            users_path: users_path.into(),
            login_history_path: login_history_path.into(),
        }
    }

    /// Store using the default file names inside `dir`
    #[cfg(test)]
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(
            dir.join(TODOS_FILE),
            dir.join(USERS_FILE),
            dir.join(LOGIN_HISTORY_FILE),
        )
    }

    pub fn todos_path(&self) -> &Path {
        &self.todos_path
    }

    pub fn users_path(&self) -> &Path {
        &self.users_path
    }

    pub fn login_history_path(&self) -> &Path {
        &self.login_history_path
    }

    /// Load every todo in file order; a missing file is an empty list
    pub fn load_todos(&self) -> Result<Vec<TodoItem>> {
        let path = &self.todos_path;
        let Some(elements) = read_array(path)? else {
            return Ok(Vec::new());
        };

        let mut seen = HashSet::with_capacity(elements.len());
        let mut todos = Vec::with_capacity(elements.len());

        for (index, element) in elements.into_iter().enumerate() {
            let Value::Object(map) = element else {
                return Err(not_an_object(path, index));
            };

            let todo = TodoItem::from_storage_map(&map)
                .map_err(|source| invalid_record(path, index, source))?;

            if !seen.insert(todo.id.clone()) {
                return Err(StoreError::corrupt(
                    path,
                    format!("duplicate id '{}' at element {index}", todo.id),
                ));
            }
            todos.push(todo);
        }

        tracing::debug!(path = %path.display(), count = todos.len(), "Loaded todos");
        Ok(todos)
    }

    /// Replace the todo file with the given collection
    pub fn save_todos(&self, todos: &[TodoItem]) -> Result<()> {
        let elements: Vec<Value> = todos
            .iter()
            .map(|todo| Value::Object(todo.to_storage_map()))
            .collect();

        write_json(&self.todos_path, &elements)?;
        tracing::debug!(path = %self.todos_path.display(), count = todos.len(), "Saved todos");
        Ok(())
    }

    /// Load every user; a missing file is an empty list
    pub fn load_users(&self) -> Result<Vec<User>> {
        let users = load_records(&self.users_path)?;
        tracing::debug!(path = %self.users_path.display(), count = users.len(), "Loaded users");
        Ok(users)
    }

    /// Replace the users file with the given list
    pub fn save_users(&self, users: &[User]) -> Result<()> {
        write_json(&self.users_path, users)?;
        tracing::debug!(path = %self.users_path.display(), count = users.len(), "Saved users");
        Ok(())
    }

    /// Load the login log in the order attempts were made
    pub fn load_login_history(&self) -> Result<Vec<LoginAttempt>> {
        load_records(&self.login_history_path)
    }

    /// Replace the login log file
    pub fn save_login_history(&self, history: &[LoginAttempt]) -> Result<()> {
        write_json(&self.login_history_path, history)
    }

    /// Append one attempt to the login log
    pub fn log_login_attempt(&self, username: &str, success: bool) -> Result<LoginAttempt> {
        let mut history = self.load_login_history()?;
        let attempt = LoginAttempt::now(username, success);
        history.push(attempt.clone());
        self.save_login_history(&history)?;
        Ok(attempt)
    }
}

fn invalid_record(path: &Path, index: usize, source: ValidationError) -> StoreError {
    StoreError::Validation {
        context: format!("{} element {index}", path.display()),
        source,
    }
}

fn not_an_object(path: &Path, index: usize) -> StoreError {
    StoreError::corrupt(path, format!("element {index} is not an object"))
}

/// Read a JSON array, or `None` when the file does not exist
///
/// Bytes that are not UTF-8 are not JSON either, so they count as corrupt data.
fn read_array(path: &Path) -> Result<Option<Vec<Value>>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::io(path, e)),
    };

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Array(elements)) => Ok(Some(elements)),
        Ok(_) => Err(StoreError::corrupt(path, "expected a JSON array")),
        Err(e) => Err(StoreError::corrupt(path, e)),
    }
}

/// Load a collection of serde records from a JSON array file
fn load_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let Some(elements) = read_array(path)? else {
        return Ok(Vec::new());
    };

    elements
        .into_iter()
        .enumerate()
        .map(|(index, element)| {
            if !element.is_object() {
                return Err(not_an_object(path, index));
            }
            serde_json::from_value(element).map_err(|e| {
                invalid_record(path, index, ValidationError::Malformed(e.to_string()))
            })
        })
        .collect()
}

/// Pretty-print `value` and atomically replace `path` with it
fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

    let mut content = serde_json::to_string_pretty(value)
        .map_err(|e| StoreError::corrupt(path, format!("failed to serialize: {e}")))?;
    content.push('\n');

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
    tmp.write_all(content.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| StoreError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| StoreError::io(path, e.error))?;

    Ok(())
}
