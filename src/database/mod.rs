use chrono::{Local, NaiveDateTime};
use rusqlite::{Connection, OptionalExtension};
use std::fmt;
use std::path::Path;
use thiserror::Error;

use crate::models::{HOME_PROJECT, ValidationError};

pub mod notes;
pub mod projects;
pub mod tags;
pub mod todos;

pub use notes::NoteUpdate;
pub use projects::ProjectEvent;
pub use tags::TagTarget;
pub use todos::{DueChange, TodoUpdate};

/// What kind of record a lookup was aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Note,
    Todo,
    Project,
    ActiveProject,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::Note => "Note",
            EntityKind::Todo => "Todo",
            EntityKind::Project => "Project",
            EntityKind::ActiveProject => "Active project",
        };
        f.write_str(label)
    }
}

/// Coarse classification of every store failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    Storage,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConflictError {
    #[error("Cannot close project '{project}' - {count} incomplete todos remaining")]
    IncompleteTodos { project: String, count: usize },
    #[error(
        "Cannot close 'home' project - it is the only open project. Create or reopen another project first."
    )]
    LastOpenHome,
    #[error("Cannot set closed project '{0}' as active. Reopen it with: note project reopen {0}")]
    ProjectClosed(String),
    #[error("Cannot delete the 'home' project. It is the default project and must always exist.")]
    DeleteHome,
    #[error("Project '{0}' already exists")]
    ProjectExists(String),
    #[error("Project '{0}' is already closed")]
    AlreadyClosed(String),
}

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Failed to create database directory: {0}")]
    DirectoryError(String),
    #[error("{}", not_found_message(*kind, key))]
    NotFound { kind: EntityKind, key: String },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Conflict(#[from] ConflictError),
}

fn not_found_message(kind: EntityKind, key: &str) -> String {
    match kind {
        EntityKind::Note | EntityKind::Todo => format!("{kind} #{key} not found"),
        EntityKind::Project => {
            format!("Project '{key}' not found. Create it with: note project create {key}")
        }
        EntityKind::ActiveProject => {
            "No active project. Activate one with: note project <name>".to_string()
        }
    }
}

impl DatabaseError {
    pub(crate) fn not_found(kind: EntityKind, key: impl ToString) -> Self {
        DatabaseError::NotFound { kind, key: key.to_string() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DatabaseError::SqliteError(_) | DatabaseError::DirectoryError(_) => ErrorKind::Storage,
            DatabaseError::NotFound { .. } => ErrorKind::NotFound,
            DatabaseError::Validation(_) => ErrorKind::Validation,
            DatabaseError::Conflict(_) => ErrorKind::Conflict,
        }
    }
}

pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Local wall-clock time, the timestamp every row is stamped with.
pub(crate) fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS notes (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        content         TEXT NOT NULL,
        created_at      TEXT NOT NULL,
        updated_at      TEXT NOT NULL,
        is_important    INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS todos (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        content         TEXT NOT NULL,
        is_complete     INTEGER NOT NULL DEFAULT 0,
        due_date        TEXT,
        created_at      TEXT NOT NULL,
        updated_at      TEXT NOT NULL,
        completed_at    TEXT
    )",
    "CREATE TABLE IF NOT EXISTS tags (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        name            TEXT NOT NULL UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS note_tags (
        note_id         INTEGER NOT NULL,
        tag_id          INTEGER NOT NULL,
        FOREIGN KEY (note_id) REFERENCES notes(id) ON DELETE CASCADE,
        FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE,
        PRIMARY KEY (note_id, tag_id)
    )",
    "CREATE TABLE IF NOT EXISTS todo_tags (
        todo_id         INTEGER NOT NULL,
        tag_id          INTEGER NOT NULL,
        FOREIGN KEY (todo_id) REFERENCES todos(id) ON DELETE CASCADE,
        FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE,
        PRIMARY KEY (todo_id, tag_id)
    )",
    "CREATE TABLE IF NOT EXISTS projects (
        id                  INTEGER PRIMARY KEY AUTOINCREMENT,
        name                TEXT NOT NULL UNIQUE,
        created_at          TEXT NOT NULL,
        first_activated_at  TEXT,
        last_activity_at    TEXT,
        closed_at           TEXT,
        is_closed           INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS project_tags (
        project_id      INTEGER NOT NULL,
        tag_id          INTEGER NOT NULL,
        FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE,
        FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE,
        PRIMARY KEY (project_id, tag_id)
    )",
    "CREATE TABLE IF NOT EXISTS active_project (
        project_id      INTEGER NOT NULL UNIQUE,
        activated_at    TEXT NOT NULL,
        FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
    )",
    "CREATE INDEX IF NOT EXISTS idx_notes_created_at ON notes(created_at)",
    "CREATE INDEX IF NOT EXISTS idx_todos_due_date ON todos(due_date)",
];

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database file, initialize the schema and make sure
    /// the `home` project exists.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let db_path = path.as_ref();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DatabaseError::DirectoryError(e.to_string()))?;
            }
        }

        log::debug!("opening database at {}", db_path.display());
        Self::from_connection(Connection::open(db_path)?)
    }

    /// A throwaway database that goes through the same schema and bootstrap path.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        let db = Database { conn };
        db.initialize_schema()?;
        db.ensure_home_project()?;
        Ok(db)
    }

    fn initialize_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            self.conn.execute(statement, [])?;
        }
        Ok(())
    }

    /// Create `home` and point the active project at it, atomically, if it is missing.
    fn ensure_home_project(&self) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM projects WHERE name = ?1",
                [HOME_PROJECT],
                |row| row.get(0),
            )
            .optional()?;

        if existing.is_none() {
            let now = now();
            tx.execute(
                "INSERT INTO projects (name, created_at, first_activated_at, is_closed)
                 VALUES (?1, ?2, ?2, 0)",
                rusqlite::params![HOME_PROJECT, now],
            )?;
            let home_id = tx.last_insert_rowid();
            tx.execute("DELETE FROM active_project", [])?;
            tx.execute(
                "INSERT INTO active_project (project_id, activated_at) VALUES (?1, ?2)",
                rusqlite::params![home_id, now],
            )?;
            log::info!("bootstrapped '{HOME_PROJECT}' project (id {home_id})");
        }

        tx.commit()?;
        Ok(())
    }

    /// Get a reference to the underlying connection
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_exists(db: &Database, name: &str) -> bool {
        db.conn()
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [name],
                |_| Ok(true),
            )
            .unwrap_or(false)
    }

    #[test]
    fn schema_is_created() {
        let db = Database::open_in_memory().unwrap();
        for table in [
            "notes",
            "todos",
            "tags",
            "note_tags",
            "todo_tags",
            "projects",
            "project_tags",
            "active_project",
        ] {
            assert!(table_exists(&db, table), "missing table {table}");
        }
    }

    #[test]
    fn bootstrap_creates_active_home() {
        let db = Database::open_in_memory().unwrap();
        let active = db.active_project().unwrap();
        assert_eq!(active.name, HOME_PROJECT);
        assert!(active.first_activated_at.is_some());
        assert!(!active.is_closed);
    }

    #[test]
    fn bootstrap_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("notes.db");

        let first = Database::new(&path).unwrap();
        let home_id = first.active_project().unwrap().id;
        drop(first);

        let second = Database::new(&path).unwrap();
        let homes: i64 = second
            .conn()
            .query_row("SELECT COUNT(*) FROM projects WHERE name = 'home'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(homes, 1);
        assert_eq!(second.active_project().unwrap().id, home_id);
    }

    #[test]
    fn error_kinds_classify_variants() {
        let missing = DatabaseError::not_found(EntityKind::Note, 7);
        assert_eq!(missing.kind(), ErrorKind::NotFound);
        assert_eq!(missing.to_string(), "Note #7 not found");

        let conflict = DatabaseError::from(ConflictError::DeleteHome);
        assert_eq!(conflict.kind(), ErrorKind::Conflict);

        let invalid = DatabaseError::from(ValidationError::BlankTag);
        assert_eq!(invalid.kind(), ErrorKind::Validation);
    }
}
