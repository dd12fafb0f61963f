//! Configuration for the todo store

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::store::{LOGIN_HISTORY_FILE, Store, TODOS_FILE, USERS_FILE};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory the data files are resolved against
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_todos_file")]
    pub todos_file: PathBuf,

    #[serde(default = "default_users_file")]
    pub users_file: PathBuf,

    #[serde(default = "default_login_history_file")]
    pub login_history_file: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_todos_file() -> PathBuf {
    PathBuf::from(TODOS_FILE)
}

fn default_users_file() -> PathBuf {
    PathBuf::from(USERS_FILE)
}

fn default_login_history_file() -> PathBuf {
    PathBuf::from(LOGIN_HISTORY_FILE)
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            todos_file: default_todos_file(),
            users_file: default_users_file(),
            login_history_file: default_login_history_file(),
        }
    }
}

impl Config {
    /// Default config path
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(env_path) = std::env::var("TODO_STORE_CONFIG") {
            return Ok(PathBuf::from(env_path));
        }

        let local = PathBuf::from("todo-store.toml");
        if local.exists() {
            return Ok(local);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("todo-store");

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from the default path, falling back to defaults
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Load config from specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Parse config from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid config")
    }

    /// Save config to specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        let with_comments = format!(
            "# todo-store configuration\n\
             # Relative file names are resolved against data_dir.\n\n\
             {}",
            content
        );

        std::fs::write(path, with_comments).context("Failed to write config file")?;

        Ok(())
    }

    /// Persistence context for the configured files
    pub fn store(&self) -> Store {
        let s = &self.storage;
        Store::new(
            s.data_dir.join(&s.todos_file),
            s.data_dir.join(&s.users_file),
            s.data_dir.join(&s.login_history_file),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_config_uses_defaults() {
        let cfg = Config::parse("").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.store(), Store::in_dir(Path::new(".")));
    }

    #[test]
    fn test_partial_storage_section() {
        let cfg = Config::parse(
            r#"
            [storage]
            data_dir = "/var/lib/todo"
            todos_file = "tasks.json"
            "#,
        )
        .unwrap();

        let store = cfg.store();
        assert_eq!(store.todos_path(), Path::new("/var/lib/todo/tasks.json"));
        assert_eq!(store.users_path(), Path::new("/var/lib/todo/users.json"));
        assert_eq!(
            store.login_history_path(),
            Path::new("/var/lib/todo/login_history.json")
        );
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        assert!(Config::parse("[storage]\ndata_dir = 5").is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conf").join("config.toml");

        let mut cfg = Config::default();
        cfg.storage.data_dir = dir.path().join("data");
        cfg.save_to(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# todo-store configuration"));
        assert_eq!(Config::load_from(&path).unwrap(), cfg);
    }
}
