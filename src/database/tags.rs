use rusqlite::{Connection, OptionalExtension};

use super::{Database, Result};
use crate::models::{Tag, TagUsage, normalize_tags};

/// The kinds of entity that carry tags, each with its own junction table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagTarget {
    Note,
    Todo,
    Project,
}

impl TagTarget {
    fn junction(self) -> &'static str {
        match self {
            TagTarget::Note => "note_tags",
            TagTarget::Todo => "todo_tags",
            TagTarget::Project => "project_tags",
        }
    }

    fn owner_column(self) -> &'static str {
        match self {
            TagTarget::Note => "note_id",
            TagTarget::Todo => "todo_id",
            TagTarget::Project => "project_id",
        }
    }
}

/// Exact, case-sensitive lookup; inserts the tag on first use.
pub(crate) fn resolve_or_create(conn: &Connection, name: &str) -> Result<i64> {
    let existing: Option<i64> = conn
        .query_row("SELECT id FROM tags WHERE name = ?1", [name], |row| row.get(0))
        .optional()?;

    match existing {
        Some(id) => Ok(id),
        None => {
            conn.execute("INSERT INTO tags (name) VALUES (?1)", [name])?;
            let id = conn.last_insert_rowid();
            log::debug!("created tag '{name}' (id {id})");
            Ok(id)
        }
    }
}

/// Tag names attached to one entity, alphabetical.
pub(crate) fn tags_of(conn: &Connection, target: TagTarget, owner_id: i64) -> Result<Vec<String>> {
    let sql = format!(
        "SELECT t.name FROM tags t
         JOIN {junction} j ON t.id = j.tag_id
         WHERE j.{owner} = ?1
         ORDER BY t.name",
        junction = target.junction(),
        owner = target.owner_column(),
    );
    let mut stmt = conn.prepare(&sql)?;
    let names = stmt
        .query_map([owner_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(names)
}

/// Attach every name, keeping associations that already exist.
pub(crate) fn add_all(
    conn: &Connection,
    target: TagTarget,
    owner_id: i64,
    names: &[String],
) -> Result<()> {
    let names = normalize_tags(names)?;
    let sql = format!(
        "INSERT OR IGNORE INTO {junction} ({owner}, tag_id) VALUES (?1, ?2)",
        junction = target.junction(),
        owner = target.owner_column(),
    );
    for name in &names {
        let tag_id = resolve_or_create(conn, name)?;
        conn.execute(&sql, rusqlite::params![owner_id, tag_id])?;
    }
    Ok(())
}

/// Drop all associations for the entity, then attach `names`. Tag rows are kept.
pub(crate) fn replace_all(
    conn: &Connection,
    target: TagTarget,
    owner_id: i64,
    names: &[String],
) -> Result<()> {
    let names = normalize_tags(names)?;
    let sql = format!(
        "DELETE FROM {junction} WHERE {owner} = ?1",
        junction = target.junction(),
        owner = target.owner_column(),
    );
    conn.execute(&sql, [owner_id])?;
    add_all(conn, target, owner_id, &names)
}

impl Database {
    /// Resolve a tag name to its id, creating the tag if needed.
    pub fn resolve_tag(&self, name: &str) -> Result<i64> {
        let name = normalize_tags(&[name])?.remove(0);
        resolve_or_create(&self.conn, &name)
    }

    pub fn tags_of(&self, target: TagTarget, owner_id: i64) -> Result<Vec<String>> {
        tags_of(&self.conn, target, owner_id)
    }

    /// Replace the full tag set of an entity in one transaction.
    pub fn replace_tags(&self, target: TagTarget, owner_id: i64, names: &[String]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        replace_all(&tx, target, owner_id, names)?;
        tx.commit()?;
        Ok(())
    }

    /// Every tag with its note + todo usage, most used first. Orphans show zero.
    pub fn list_tags(&self) -> Result<Vec<TagUsage>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.id, t.name,
                (SELECT COUNT(*) FROM note_tags WHERE tag_id = t.id) +
                (SELECT COUNT(*) FROM todo_tags WHERE tag_id = t.id) AS usage_count
             FROM tags t
             ORDER BY usage_count DESC, t.name",
        )?;
        let tags = stmt
            .query_map([], |row| {
                Ok(TagUsage {
                    tag: Tag { id: row.get(0)?, name: row.get(1)? },
                    usage_count: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(tags)
    }
}
