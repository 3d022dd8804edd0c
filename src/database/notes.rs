use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension};

use super::tags::{self, TagTarget};
use super::{Database, DatabaseError, EntityKind, Result, now};
use crate::models::{Note, Project};

/// Fields to change on a note. `None` leaves the field alone; `tags` replaces the whole set.
#[derive(Debug, Clone, Default)]
pub struct NoteUpdate {
    pub content: Option<String>,
    pub important: Option<bool>,
    pub tags: Option<Vec<String>>,
}

impl NoteUpdate {
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.important.is_none() && self.tags.is_none()
    }
}

pub(crate) const NOTE_COLUMNS: &str = "n.id, n.content, n.created_at, n.updated_at, n.is_important";

/// Map a row selected with `NOTE_COLUMNS` to a note without its tags.
pub(crate) fn row_to_note(row: &rusqlite::Row) -> std::result::Result<Note, rusqlite::Error> {
    Ok(Note {
        id: row.get(0)?,
        content: row.get(1)?,
        created_at: row.get(2)?,
        updated_at: row.get(3)?,
        is_important: row.get::<_, i64>(4)? != 0,
        tags: Vec::new(),
    })
}

fn insert_note(
    conn: &Connection,
    content: &str,
    tags: &[String],
    important: bool,
    stamp: NaiveDateTime,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO notes (content, is_important, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?3)",
        rusqlite::params![content, important, stamp],
    )?;
    let id = conn.last_insert_rowid();
    tags::add_all(conn, TagTarget::Note, id, tags)?;
    Ok(id)
}

pub(crate) fn get_note(conn: &Connection, id: i64) -> Result<Note> {
    let sql = format!("SELECT {NOTE_COLUMNS} FROM notes n WHERE n.id = ?1");
    let mut note = conn
        .query_row(&sql, [id], row_to_note)
        .optional()?
        .ok_or_else(|| DatabaseError::not_found(EntityKind::Note, id))?;
    note.tags = tags::tags_of(conn, TagTarget::Note, id)?;
    Ok(note)
}

impl Database {
    /// Insert a note with exactly the given tags.
    pub fn create_note(&self, content: &str, tags: &[String], important: bool) -> Result<Note> {
        let tx = self.conn.unchecked_transaction()?;
        let id = insert_note(&tx, content, tags, important, now())?;
        tx.commit()?;
        self.get_note(id)
    }

    /// Insert a note filed under `project`: the project name is appended as a tag
    /// and the project's last activity is bumped.
    pub fn create_note_in_project(
        &self,
        project: &Project,
        content: &str,
        tags: &[String],
        important: bool,
    ) -> Result<Note> {
        let mut all_tags = tags.to_vec();
        all_tags.push(project.name.clone());

        let stamp = now();
        let tx = self.conn.unchecked_transaction()?;
        let id = insert_note(&tx, content, &all_tags, important, stamp)?;
        super::projects::touch(&tx, project.id, stamp)?;
        tx.commit()?;

        log::debug!("note #{id} filed under '{}'", project.name);
        self.get_note(id)
    }

    pub fn get_note(&self, id: i64) -> Result<Note> {
        get_note(&self.conn, id)
    }

    /// Apply `update`, bumping `updated_at` when anything changed.
    pub fn update_note(&self, id: i64, update: &NoteUpdate) -> Result<Note> {
        let tx = self.conn.unchecked_transaction()?;
        get_note(&tx, id)?;

        if !update.is_empty() {
            if let Some(content) = &update.content {
                tx.execute("UPDATE notes SET content = ?1 WHERE id = ?2", rusqlite::params![content, id])?;
            }
            if let Some(important) = update.important {
                tx.execute(
                    "UPDATE notes SET is_important = ?1 WHERE id = ?2",
                    rusqlite::params![important, id],
                )?;
            }
            if let Some(names) = &update.tags {
                tags::replace_all(&tx, TagTarget::Note, id, names)?;
            }
            tx.execute("UPDATE notes SET updated_at = ?1 WHERE id = ?2", rusqlite::params![now(), id])?;
        }

        tx.commit()?;
        self.get_note(id)
    }

    /// Delete a note; its tag associations go with it.
    pub fn delete_note(&self, id: i64) -> Result<()> {
        let deleted = self.conn.execute("DELETE FROM notes WHERE id = ?1", [id])?;
        if deleted == 0 {
            return Err(DatabaseError::not_found(EntityKind::Note, id));
        }
        Ok(())
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
    fn create_and_fetch() {
        let db = Database::open_in_memory().unwrap();
        let note = db.create_note("fixed bug", &strings(&["work"]), true).unwrap();

        let fetched = db.get_note(note.id).unwrap();
        assert_eq!(fetched.content, "fixed bug");
        assert!(fetched.is_important);
        assert_eq!(fetched.tags, strings(&["work"]));
        assert_eq!(fetched.created_at, fetched.updated_at);
    }

    #[test]
    fn note_in_active_home_gets_home_tag() {
        let db = Database::open_in_memory().unwrap();
        let home = db.active_project().unwrap();
        assert!(home.last_activity_at.is_none());

        let note = db.create_note_in_project(&home, "fixed bug", &strings(&["work"]), false).unwrap();
        assert_eq!(note.tags, strings(&["home", "work"]));

        let home = db.get_project("home").unwrap();
        assert!(home.last_activity_at.is_some());
    }

    #[test]
    fn update_changes_fields_and_bumps_updated_at() {
        let db = Database::open_in_memory().unwrap();
        let note = db.create_note("first", &strings(&["a"]), false).unwrap();
        db.conn()
            .execute(
                "UPDATE notes SET created_at = '2020-01-01 08:00:00', updated_at = '2020-01-01 08:00:00' WHERE id = ?1",
                [note.id],
            )
            .unwrap();

        let updated = db
            .update_note(
                note.id,
                &NoteUpdate { content: Some("second".into()), important: Some(true), tags: None },
            )
            .unwrap();
        assert_eq!(updated.content, "second");
        assert!(updated.is_important);
        assert_eq!(updated.tags, strings(&["a"]));
        assert!(updated.updated_at > updated.created_at);
    }

    #[test]
    fn empty_update_leaves_updated_at_alone() {
        let db = Database::open_in_memory().unwrap();
        let note = db.create_note("same", &[], false).unwrap();
        let after = db.update_note(note.id, &NoteUpdate::default()).unwrap();
        assert_eq!(after.updated_at, note.updated_at);
    }

    #[test]
    fn missing_note_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.get_note(42).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(db.delete_note(42).unwrap_err().kind(), ErrorKind::NotFound);
        let err = db.update_note(42, &NoteUpdate::default()).unwrap_err();
        assert_eq!(err.to_string(), "Note #42 not found");
    }
}
