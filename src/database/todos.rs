use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{Connection, OptionalExtension};

use super::tags::{self, TagTarget};
use super::{Database, DatabaseError, EntityKind, Result, now};
use crate::models::{Project, Todo};
use crate::query::TodoQuery;

/// How an edit treats the due date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DueChange {
    #[default]
    Keep,
    Set(NaiveDate),
    Clear,
}

/// Fields to change on a todo. `tags` replaces the whole set.
#[derive(Debug, Clone, Default)]
pub struct TodoUpdate {
    pub content: Option<String>,
    pub due: DueChange,
    pub tags: Option<Vec<String>>,
}

impl TodoUpdate {
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.due == DueChange::Keep && self.tags.is_none()
    }

    /// Human readable change list, one entry per touched field.
    pub fn describe(&self) -> Vec<String> {
        let mut changes = Vec::new();
        if let Some(content) = &self.content {
            changes.push(format!("Updated content to \"{content}\""));
        }
        match self.due {
            DueChange::Keep => {}
            DueChange::Set(date) => changes.push(format!("due date to {}", date.format("%Y-%m-%d"))),
            DueChange::Clear => changes.push("Removed due date".to_string()),
        }
        if let Some(names) = &self.tags {
            let formatted: Vec<String> = names.iter().map(|t| format!("#{t}")).collect();
            changes.push(format!("tags to {}", formatted.join(" ")));
        }
        changes
    }
}

pub(crate) const TODO_COLUMNS: &str =
    "t.id, t.content, t.is_complete, t.due_date, t.created_at, t.updated_at, t.completed_at";

/// Map a row selected with `TODO_COLUMNS` to a todo without its tags.
pub(crate) fn row_to_todo(row: &rusqlite::Row) -> std::result::Result<Todo, rusqlite::Error> {
    Ok(Todo {
        id: row.get(0)?,
        content: row.get(1)?,
        is_complete: row.get::<_, i64>(2)? != 0,
        due_date: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
        completed_at: row.get(6)?,
        tags: Vec::new(),
    })
}

fn insert_todo(
    conn: &Connection,
    content: &str,
    tags: &[String],
    due_date: Option<NaiveDate>,
    stamp: NaiveDateTime,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO todos (content, due_date, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?3)",
        rusqlite::params![content, due_date, stamp],
    )?;
    let id = conn.last_insert_rowid();
    tags::add_all(conn, TagTarget::Todo, id, tags)?;
    Ok(id)
}

pub(crate) fn get_todo(conn: &Connection, id: i64) -> Result<Todo> {
    let sql = format!("SELECT {TODO_COLUMNS} FROM todos t WHERE t.id = ?1");
    let mut todo = conn
        .query_row(&sql, [id], row_to_todo)
        .optional()?
        .ok_or_else(|| DatabaseError::not_found(EntityKind::Todo, id))?;
    todo.tags = tags::tags_of(conn, TagTarget::Todo, id)?;
    Ok(todo)
}

/// Open todos carrying the tag `project_name`.
pub(crate) fn count_incomplete_tagged(conn: &Connection, project_name: &str) -> Result<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(DISTINCT t.id)
         FROM todos t
         JOIN todo_tags tt ON t.id = tt.todo_id
         JOIN tags tg ON tt.tag_id = tg.id
         WHERE tg.name = ?1 AND t.is_complete = 0",
        [project_name],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

impl Database {
    /// Insert a todo with exactly the given tags.
    pub fn create_todo(&self, content: &str, tags: &[String], due_date: Option<NaiveDate>) -> Result<Todo> {
        let tx = self.conn.unchecked_transaction()?;
        let id = insert_todo(&tx, content, tags, due_date, now())?;
        tx.commit()?;
        self.get_todo(id)
    }

    /// Insert a todo filed under `project`: the project name is appended as a tag
    /// and the project's last activity is bumped.
    pub fn create_todo_in_project(
        &self,
        project: &Project,
        content: &str,
        tags: &[String],
        due_date: Option<NaiveDate>,
    ) -> Result<Todo> {
        let mut all_tags = tags.to_vec();
        all_tags.push(project.name.clone());

        let stamp = now();
        let tx = self.conn.unchecked_transaction()?;
        let id = insert_todo(&tx, content, &all_tags, due_date, stamp)?;
        super::projects::touch(&tx, project.id, stamp)?;
        tx.commit()?;

        log::debug!("todo #{id} filed under '{}'", project.name);
        self.get_todo(id)
    }

    pub fn get_todo(&self, id: i64) -> Result<Todo> {
        get_todo(&self.conn, id)
    }

    /// Apply `update`, bumping `updated_at` when anything changed.
    pub fn update_todo(&self, id: i64, update: &TodoUpdate) -> Result<Todo> {
        let tx = self.conn.unchecked_transaction()?;
        get_todo(&tx, id)?;

        if !update.is_empty() {
            if let Some(content) = &update.content {
                tx.execute("UPDATE todos SET content = ?1 WHERE id = ?2", rusqlite::params![content, id])?;
            }
            match update.due {
                DueChange::Keep => {}
                DueChange::Set(date) => {
                    tx.execute("UPDATE todos SET due_date = ?1 WHERE id = ?2", rusqlite::params![date, id])?;
                }
                DueChange::Clear => {
                    tx.execute("UPDATE todos SET due_date = NULL WHERE id = ?1", [id])?;
                }
            }
            if let Some(names) = &update.tags {
                tags::replace_all(&tx, TagTarget::Todo, id, names)?;
            }
            tx.execute("UPDATE todos SET updated_at = ?1 WHERE id = ?2", rusqlite::params![now(), id])?;
        }

        tx.commit()?;
        self.get_todo(id)
    }

    /// Mark complete, stamping `completed_at`.
    pub fn complete_todo(&self, id: i64) -> Result<Todo> {
        let stamp = now();
        let changed = self.conn.execute(
            "UPDATE todos SET is_complete = 1, completed_at = ?1, updated_at = ?1 WHERE id = ?2",
            rusqlite::params![stamp, id],
        )?;
        if changed == 0 {
            return Err(DatabaseError::not_found(EntityKind::Todo, id));
        }
        self.get_todo(id)
    }

    /// Mark incomplete, clearing `completed_at`.
    pub fn uncomplete_todo(&self, id: i64) -> Result<Todo> {
        let changed = self.conn.execute(
            "UPDATE todos SET is_complete = 0, completed_at = NULL, updated_at = ?1 WHERE id = ?2",
            rusqlite::params![now(), id],
        )?;
        if changed == 0 {
            return Err(DatabaseError::not_found(EntityKind::Todo, id));
        }
        self.get_todo(id)
    }

    pub fn delete_todo(&self, id: i64) -> Result<()> {
        let deleted = self.conn.execute("DELETE FROM todos WHERE id = ?1", [id])?;
        if deleted == 0 {
            return Err(DatabaseError::not_found(EntityKind::Todo, id));
        }
        Ok(())
    }

    /// Open todos tagged with the project's name, in listing order.
    pub fn incomplete_todos_for_project(&self, project_name: &str) -> Result<Vec<Todo>> {
        let query = TodoQuery::new(chrono::Local::now().date_naive())
            .with_tags([project_name])
            .incomplete();
        self.list_todos(&query)
    }

    /// Finished todos tagged with the project's name, most recently completed first.
    pub fn complete_todos_for_project(&self, project_name: &str) -> Result<Vec<Todo>> {
        let query = TodoQuery::new(chrono::Local::now().date_naive())
            .with_tags([project_name])
            .complete();
        let mut todos = self.list_todos(&query)?;
        todos.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Ok(todos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::ErrorKind;

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn complete_and_uncomplete_keep_completed_at_in_step() {
        let db = Database::open_in_memory().unwrap();
        let todo = db.create_todo("ship", &[], None).unwrap();
        assert!(!todo.is_complete);
        assert!(todo.completed_at.is_none());

        let done = db.complete_todo(todo.id).unwrap();
        assert!(done.is_complete);
        assert!(done.completed_at.is_some());

        let reopened = db.uncomplete_todo(todo.id).unwrap();
        assert!(!reopened.is_complete);
        assert!(reopened.completed_at.is_none());
    }

    #[test]
    fn due_date_round_trips_as_a_date() {
        let db = Database::open_in_memory().unwrap();
        let due = NaiveDate::from_ymd_opt(2026, 11, 2).unwrap();
        let todo = db.create_todo("renew passport", &[], Some(due)).unwrap();
        assert_eq!(db.get_todo(todo.id).unwrap().due_date, Some(due));
    }

    #[test]
    fn update_sets_and_clears_due_date() {
        let db = Database::open_in_memory().unwrap();
        let todo = db.create_todo("call bank", &strings(&["errand"]), None).unwrap();
        let due = NaiveDate::from_ymd_opt(2026, 12, 24).unwrap();

        let set = db.update_todo(todo.id, &TodoUpdate { due: DueChange::Set(due), ..Default::default() }).unwrap();
        assert_eq!(set.due_date, Some(due));
        assert_eq!(set.tags, strings(&["errand"]));

        let cleared = db.update_todo(todo.id, &TodoUpdate { due: DueChange::Clear, ..Default::default() }).unwrap();
        assert_eq!(cleared.due_date, None);
    }

    #[test]
    fn tag_edits_replace_never_merge() {
        let db = Database::open_in_memory().unwrap();
        let todo = db.create_todo("write docs", &[], None).unwrap();

        db.update_todo(todo.id, &TodoUpdate { tags: Some(strings(&["a", "b"])), ..Default::default() })
            .unwrap();
        let after = db
            .update_todo(todo.id, &TodoUpdate { tags: Some(strings(&["c"])), ..Default::default() })
            .unwrap();

        assert_eq!(after.tags, strings(&["c"]));
    }

    #[test]
    fn describe_lists_each_change() {
        let update = TodoUpdate {
            content: Some("new text".into()),
            due: DueChange::Clear,
            tags: Some(strings(&["x", "y"])),
        };
        assert_eq!(
            update.describe(),
            strings(&["Updated content to \"new text\"", "Removed due date", "tags to #x #y"])
        );
        assert!(TodoUpdate::default().describe().is_empty());
    }

    #[test]
    fn todo_in_project_is_tagged_and_counted() {
        let db = Database::open_in_memory().unwrap();
        let home = db.active_project().unwrap();
        let todo = db.create_todo_in_project(&home, "tidy desk", &strings(&["chore"]), None).unwrap();
        assert_eq!(todo.tags, strings(&["chore", "home"]));
        assert_eq!(count_incomplete_tagged(db.conn(), "home").unwrap(), 1);

        db.complete_todo(todo.id).unwrap();
        assert_eq!(count_incomplete_tagged(db.conn(), "home").unwrap(), 0);
        assert_eq!(db.complete_todos_for_project("home").unwrap().len(), 1);
        assert!(db.incomplete_todos_for_project("home").unwrap().is_empty());
    }

    #[test]
    fn missing_todo_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.complete_todo(9).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(db.uncomplete_todo(9).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(db.delete_todo(9).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(db.get_todo(9).unwrap_err().to_string(), "Todo #9 not found");
    }
}
