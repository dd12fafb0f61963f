//! todo - single-user to-do manager backed by JSON files
//!
//! Users, todos and the login log each live in one JSON file that is
//! reloaded and rewritten in full by every command.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

mod config;
mod error;
mod models;
mod ops;
mod store;

use config::Config;
use models::{Priority, TodoItem};
use store::Store;

#[derive(Parser)]
#[command(name = "todo")]
#[command(about = "Manage your to-do list from the command line")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Credentials for commands that act on a user's todos
#[derive(Args)]
struct Credentials {
    /// Username
    #[arg(short, long, env = "TODO_USER")]
    user: String,

    /// Password
    #[arg(short, long, env = "TODO_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init {
        /// Output path for config file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Register a new user
    Signup {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },

    /// Check credentials (the attempt is recorded in the login log)
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },

    /// Create a todo
    Add {
        #[command(flatten)]
        login: Credentials,

        #[arg(short, long)]
        title: String,

        #[arg(short, long, default_value = "")]
        details: String,

        /// HIGH, MID or LOW (anything else means MID)
        #[arg(long)]
        priority: Option<String>,
    },

    /// List your todos
    List {
        #[command(flatten)]
        login: Credentials,

        /// Only show pending todos
        #[arg(long)]
        pending: bool,
    },

    /// Show one todo in full
    Show {
        #[command(flatten)]
        login: Credentials,

        id: String,
    },

    /// Change a todo's title, details or priority
    Edit {
        #[command(flatten)]
        login: Credentials,

        id: String,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        details: Option<String>,

        #[arg(long)]
        priority: Option<String>,
    },

    /// Mark a todo as completed
    Complete {
        #[command(flatten)]
        login: Credentials,

        id: String,
    },

    /// Show the login log (attempts made with `todo login`)
    History {
        /// Only attempts for this username
        #[arg(long)]
        username: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("todo=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    run(cli.config.as_deref(), cli.command)
}

fn open_store(config: Option<&Path>) -> Result<Store> {
    let cfg = match config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let store = cfg.store();
    tracing::debug!(
        todos = %store.todos_path().display(),
        users = %store.users_path().display(),
        login_history = %store.login_history_path().display(),
        "Using data files"
    );
    Ok(store)
}

fn run(config: Option<&Path>, command: Commands) -> Result<()> {
    match command {
        Commands::Init { output } => {
            let path = output.unwrap_or_else(|| PathBuf::from("todo-store.toml"));
            Config::default().save_to(&path)?;
            println!("Created config file: {}", path.display());
            Ok(())
        }

        Commands::Signup { username, password } => {
            let store = &open_store(config)?;
            ops::sign_up(store, &username, &password).context("Sign up failed")?;
            println!("Account '{}' created.", username);
            Ok(())
        }

        Commands::Login { username, password } => {
            let store = &open_store(config)?;
            ops::authenticate(store, &username, &password).context("Login failed")?;
            println!("Welcome, {}!", username);
            Ok(())
        }

        Commands::Add {
            login,
            title,
            details,
            priority,
        } => {
            let store = &open_store(config)?;
            let owner = verify_owner(store, &login)?;
            let new = ops::NewTodo {
                title,
                details,
                priority: Priority::from_input(priority.as_deref()),
                ..ops::NewTodo::default()
            };
            let todo = ops::create_todo(store, &owner, new)?;
            println!("Added '{}' ({})", todo.title, todo.id);
            Ok(())
        }

        Commands::List { login, pending } => {
            let store = &open_store(config)?;
            let owner = verify_owner(store, &login)?;
            let todos: Vec<TodoItem> = ops::todos_for_owner(store, &owner)?
                .into_iter()
                .filter(|t| !pending || !t.is_completed())
                .collect();

            if todos.is_empty() {
                println!("No todos.");
            }
            for (n, todo) in todos.iter().enumerate() {
                print_summary(n + 1, todo);
            }
            Ok(())
        }

        Commands::Show { login, id } => {
            let store = &open_store(config)?;
            let owner = verify_owner(store, &login)?;
            let todo = ops::find_todo(store, &owner, &id)?;
            print_details(&todo);
            Ok(())
        }

        Commands::Edit {
            login,
            id,
            title,
            details,
            priority,
        } => {
            let store = &open_store(config)?;
            let owner = verify_owner(store, &login)?;
            let edit = ops::TodoEdit {
                title,
                details,
                priority: priority.map(|p| Priority::from_input(Some(&p))),
            };
            let todo = ops::edit_todo(store, &owner, &id, edit)?;
            println!("Updated '{}'.", todo.title);
            Ok(())
        }

        Commands::Complete { login, id } => {
            let store = &open_store(config)?;
            let owner = verify_owner(store, &login)?;
            let todo = ops::mark_completed(store, &owner, &id)?;
            println!("'{}' marked as completed.", todo.title);
            Ok(())
        }

        Commands::History { username } => {
            let store = &open_store(config)?;
            let history = ops::login_history(store, username.as_deref())?;
            if history.is_empty() {
                println!("No login attempts recorded.");
            }
            for attempt in history {
                let outcome = if attempt.success { "ok" } else { "FAILED" };
                println!(
                    "{}  {:<6}  {}",
                    attempt.timestamp, outcome, attempt.username
                );
            }
            Ok(())
        }
    }
}

/// Resolve the owner for a todo command; the login log is left untouched
fn verify_owner(store: &Store, login: &Credentials) -> Result<String> {
    let user = ops::verify_credentials(store, &login.user, &login.password)
        .context("Login failed")?;
    Ok(user.username)
}

fn print_summary(n: usize, todo: &TodoItem) {
    let mark = if todo.is_completed() { "✓" } else { "○" };
    println!(
        "{:>3}. {} [{}] {}  ({})",
        n, mark, todo.priority, todo.title, todo.id
    );
}

fn print_details(todo: &TodoItem) {
    println!("Title:    {}", todo.title);
    println!("Details:  {}", todo.details);
    println!("Priority: {}", todo.priority);
    println!("Status:   {}", todo.status);
    println!("Created:  {}", todo.created_at);
    println!("Updated:  {}", todo.updated_at);
    println!("ID:       {}", todo.id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("todo-store.toml");
        let mut cfg = Config::default();
        cfg.storage.data_dir = dir.path().join("data");
        cfg.save_to(&path).unwrap();
        path
    }

    fn credentials(user: &str, password: &str) -> Credentials {
        Credentials {
            user: user.into(),
            password: password.into(),
        }
    }

    #[test]
    fn test_init_does_not_read_existing_config() {
        let dir = TempDir::new().unwrap();
        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "[storage\n").unwrap();
        let output = dir.path().join("fresh.toml");

        let command = Commands::Init {
            output: Some(output.clone()),
        };
        run(Some(&broken), command).unwrap();

        assert_eq!(Config::load_from(&output).unwrap(), Config::default());
        let history = Commands::History { username: None };
        assert!(run(Some(&broken), history).is_err());
    }

    #[test]
    fn test_only_login_command_writes_login_log() {
        let dir = TempDir::new().unwrap();
        let config = write_config(&dir);
        let store = Config::load_from(&config).unwrap().store();

        let signup = Commands::Signup {
            username: "alice".into(),
            password: "pass123".into(),
        };
        run(Some(&config), signup).unwrap();

        let add = Commands::Add {
            login: credentials("alice", "pass123"),
            title: "Buy milk".into(),
            details: String::new(),
            priority: None,
        };
        run(Some(&config), add).unwrap();

        let list = Commands::List {
            login: credentials("alice", "pass123"),
            pending: false,
        };
        run(Some(&config), list).unwrap();

        let list = Commands::List {
            login: credentials("alice", "wrong"),
            pending: false,
        };
        assert!(run(Some(&config), list).is_err());
        assert!(store.load_login_history().unwrap().is_empty());
        assert_eq!(store.load_todos().unwrap().len(), 1);

        let login = Commands::Login {
            username: "alice".into(),
            password: "pass123".into(),
        };
        run(Some(&config), login).unwrap();

        let history = store.load_login_history().unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].success);
    }
}
