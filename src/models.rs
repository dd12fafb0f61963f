//! Data models for todos, users and the login log
//!
//! Uses String for IDs and timestamps so stored files stay plain JSON.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ValidationError;

/// String-keyed flat form of a record, as written to disk
pub type StorageMap = Map<String, Value>;

/// Current time as an ISO-8601 / RFC 3339 UTC timestamp
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Priority level for todos
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    High,
    #[default]
    Mid,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Mid, Priority::Low];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "HIGH",
            Priority::Mid => "MID",
            Priority::Low => "LOW",
        }
    }

    /// Lenient parse for user input; anything unrecognised falls back to `MID`
    pub fn from_input(input: Option<&str>) -> Self {
        let Some(raw) = input.map(str::trim).filter(|s| !s.is_empty()) else {
            return Priority::default();
        };

        match raw.to_ascii_uppercase().as_str() {
            "HIGH" | "H" | "1" => Priority::High,
            "MID" | "MEDIUM" | "M" | "2" => Priority::Mid,
            "LOW" | "L" | "3" => Priority::Low,
            _ => {
                tracing::warn!(input = raw, "Unrecognised priority, using MID");
                Priority::default()
            }
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownPriority(s.to_string()))
    }
}

/// Completion state of a todo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Pending,
    Completed,
}

impl Status {
    pub const ALL: [Status; 2] = [Status::Pending, Status::Completed];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "PENDING",
            Status::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownStatus(s.to_string()))
    }
}

/// A single task owned by one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoItem {
    pub id: String,
    pub title: String,
    pub details: String,
    pub priority: Priority,
    pub status: Status,
    pub owner: String,
    pub created_at: String,
    pub updated_at: String,
}

impl TodoItem {
    /// New pending item with a fresh id; both timestamps are the same instant
    pub fn new(
        title: impl Into<String>,
        details: impl Into<String>,
        priority: Priority,
        owner: impl Into<String>,
    ) -> Self {
        let now = now_timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            details: details.into(),
            priority,
            status: Status::default(),
            owner: owner.into(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == Status::Completed
    }

    /// Bump `updated_at`, never moving it before `created_at`
    pub fn touch(&mut self) {
        let now = now_timestamp();
        self.updated_at = if now < self.created_at {
            self.created_at.clone()
        } else {
            now
        };
    }

    pub fn to_storage_map(&self) -> StorageMap {
        let mut map = Map::new();
        map.insert("id".into(), Value::String(self.id.clone()));
        map.insert("title".into(), Value::String(self.title.clone()));
        map.insert("details".into(), Value::String(self.details.clone()));
        map.insert("priority".into(), self.priority.as_str().into());
        map.insert("status".into(), self.status.as_str().into());
        map.insert("owner".into(), Value::String(self.owner.clone()));
        map.insert("created_at".into(), Value::String(self.created_at.clone()));
        map.insert("updated_at".into(), Value::String(self.updated_at.clone()));
        map
    }

    pub fn from_storage_map(map: &StorageMap) -> Result<Self, ValidationError> {
        let owner = string_field(map, "owner")?;
        if owner.is_empty() {
            return Err(ValidationError::Empty("owner"));
        }

        Ok(Self {
            id: string_field(map, "id")?,
            title: string_field(map, "title")?,
            details: string_field(map, "details")?,
            priority: string_field(map, "priority")?.parse()?,
            status: string_field(map, "status")?.parse()?,
            owner,
            created_at: string_field(map, "created_at")?,
            updated_at: string_field(map, "updated_at")?,
        })
    }
}

fn string_field(map: &StorageMap, key: &'static str) -> Result<String, ValidationError> {
    match map.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ValidationError::NotAString(key)),
        None => Err(ValidationError::MissingField(key)),
    }
}

/// A registered user (password kept in plain text, as the files always have)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub password: String,
}

/// One entry of the append-only login log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginAttempt {
    pub timestamp: String,
    pub username: String,
    pub success: bool,
}

impl LoginAttempt {
    pub fn now(username: impl Into<String>, success: bool) -> Self {
        Self {
            timestamp: now_timestamp(),
            username: username.into(),
            success,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_map() -> StorageMap {
        let value = serde_json::json!({
            "id": "test-uuid-123",
            "title": "From Dict Task",
            "details": "Created from dict",
            "priority": "HIGH",
            "status": "PENDING",
            "owner": "testuser",
            "created_at": "2025-01-01T10:00:00",
            "updated_at": "2025-01-01T10:00:00"
        });
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_enum_names() {
        assert_eq!(Priority::High.to_string(), "HIGH");
        assert_eq!(Priority::Mid.to_string(), "MID");
        assert_eq!(Priority::Low.to_string(), "LOW");
        assert_eq!(Status::Pending.to_string(), "PENDING");
        assert_eq!(Status::Completed.to_string(), "COMPLETED");
    }

    #[test]
    fn test_enum_parse_is_exact() {
        assert_eq!("LOW".parse::<Priority>(), Ok(Priority::Low));
        assert_eq!(
            "URGENT".parse::<Priority>(),
            Err(ValidationError::UnknownPriority("URGENT".into()))
        );
        assert!("low".parse::<Priority>().is_err());
        assert_eq!(
            "DONE".parse::<Status>(),
            Err(ValidationError::UnknownStatus("DONE".into()))
        );
    }

    #[test]
    fn test_priority_from_input_defaults_to_mid() {
        assert_eq!(Priority::from_input(None), Priority::Mid);
        assert_eq!(Priority::from_input(Some("  ")), Priority::Mid);
        assert_eq!(Priority::from_input(Some("whatever")), Priority::Mid);
        assert_eq!(Priority::from_input(Some("high")), Priority::High);
        assert_eq!(Priority::from_input(Some("3")), Priority::Low);
    }

    #[test]
    fn test_new_item_defaults() {
        let todo = TodoItem::new("Test Task", "This is a test", Priority::High, "testuser");
        assert_eq!(todo.title, "Test Task");
        assert_eq!(todo.status, Status::Pending);
        assert!(!todo.id.is_empty());
        assert_eq!(todo.created_at, todo.updated_at);
        assert!(Uuid::parse_str(&todo.id).is_ok());
    }

    #[test]
    fn test_identical_items_get_distinct_ids() {
        let a = TodoItem::new("Task", "Details", Priority::Low, "user");
        let b = TodoItem::new("Task", "Details", Priority::Low, "user");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_to_storage_map_uses_names() {
        let mut todo = TodoItem::new("Test Task", "Test details", Priority::Low, "testuser");
        todo.status = Status::Completed;
        let map = todo.to_storage_map();
        assert_eq!(map["priority"], "LOW");
        assert_eq!(map["status"], "COMPLETED");
        assert_eq!(map["id"], todo.id.as_str());
        assert_eq!(map.len(), 8);
    }

    #[test]
    fn test_from_storage_map() {
        let todo = TodoItem::from_storage_map(&sample_map()).unwrap();
        assert_eq!(todo.id, "test-uuid-123");
        assert_eq!(todo.priority, Priority::High);
        assert_eq!(todo.status, Status::Pending);
        assert_eq!(todo.owner, "testuser");
        assert_eq!(todo.created_at, "2025-01-01T10:00:00");
    }

    #[test]
    fn test_storage_map_round_trip() {
        for priority in Priority::ALL {
            for status in Status::ALL {
                let mut todo = TodoItem::new("Round Trip", "", priority, "alice");
                todo.status = status;
                let restored = TodoItem::from_storage_map(&todo.to_storage_map()).unwrap();
                assert_eq!(restored, todo);
            }
        }
    }

    #[test]
    fn test_from_storage_map_rejects_bad_records() {
        let mut map = sample_map();
        map.insert("priority".into(), "URGENT".into());
        assert_eq!(
            TodoItem::from_storage_map(&map),
            Err(ValidationError::UnknownPriority("URGENT".into()))
        );

        let mut map = sample_map();
        map.remove("updated_at");
        assert_eq!(
            TodoItem::from_storage_map(&map),
            Err(ValidationError::MissingField("updated_at"))
        );

        let mut map = sample_map();
        map.insert("title".into(), Value::from(7));
        assert_eq!(
            TodoItem::from_storage_map(&map),
            Err(ValidationError::NotAString("title"))
        );

        let mut map = sample_map();
        map.insert("owner".into(), "".into());
        assert_eq!(
            TodoItem::from_storage_map(&map),
            Err(ValidationError::Empty("owner"))
        );
    }

    #[test]
    fn test_touch_keeps_created_at() {
        let mut todo = TodoItem::from_storage_map(&sample_map()).unwrap();
        todo.touch();
        assert_eq!(todo.created_at, "2025-01-01T10:00:00");
        assert_ne!(todo.updated_at, "2025-01-01T10:00:00");
        assert!(todo.updated_at > todo.created_at);
    }

    #[test]
    fn test_touch_never_precedes_created_at() {
        let mut todo = TodoItem::new("Skewed", "", Priority::Mid, "alice");
        todo.created_at = "9999-01-01T00:00:00".into();
        todo.touch();
        assert_eq!(todo.updated_at, todo.created_at);
    }
}
