//! Projects and the single-row active-project pointer.
//!
//! Every transition runs inside one transaction and returns the events it
//! produced, in order. Audit notes are written from those events by the
//! caller after commit, so a failed audit never undoes a transition.

use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension};

use super::tags::{self, TagTarget};
use super::todos::count_incomplete_tagged;
use super::{ConflictError, Database, DatabaseError, EntityKind, Result, now};
use crate::models::{HOME_PROJECT, Project, ProjectState, validate_project_name};

/// A user-observable change to a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectEvent {
    Created(Project),
    Activated(String),
    Deactivated(String),
    TagsUpdated { name: String, tags: Vec<String> },
    Closed(String),
    Reopened(String),
    Deleted(Project),
}

const PROJECT_COLUMNS: &str =
    "id, name, created_at, first_activated_at, last_activity_at, closed_at, is_closed";

fn row_to_project(row: &rusqlite::Row) -> std::result::Result<Project, rusqlite::Error> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: row.get(2)?,
        first_activated_at: row.get(3)?,
        last_activity_at: row.get(4)?,
        closed_at: row.get(5)?,
        is_closed: row.get::<_, i64>(6)? != 0,
        tags: Vec::new(),
    })
}

fn find_by_name(conn: &Connection, name: &str) -> Result<Option<Project>> {
    let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE name = ?1");
    let project = conn.query_row(&sql, [name], row_to_project).optional()?;
    match project {
        Some(mut project) => {
            project.tags = tags::tags_of(conn, TagTarget::Project, project.id)?;
            Ok(Some(project))
        }
        None => Ok(None),
    }
}

fn get_by_name(conn: &Connection, name: &str) -> Result<Project> {
    find_by_name(conn, name)?.ok_or_else(|| DatabaseError::not_found(EntityKind::Project, name))
}

fn get_by_id(conn: &Connection, id: i64) -> Result<Project> {
    let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1");
    let mut project = conn
        .query_row(&sql, [id], row_to_project)
        .optional()?
        .ok_or_else(|| DatabaseError::not_found(EntityKind::Project, id))?;
    project.tags = tags::tags_of(conn, TagTarget::Project, id)?;
    Ok(project)
}

fn active_id(conn: &Connection) -> Result<Option<i64>> {
    let id = conn
        .query_row("SELECT project_id FROM active_project", [], |row| row.get(0))
        .optional()?;
    Ok(id)
}

/// Replace the pointer row and record the first activation. Callers own the transaction.
fn set_active(conn: &Connection, project_id: i64, stamp: NaiveDateTime) -> Result<()> {
    conn.execute("DELETE FROM active_project", [])?;
    conn.execute(
        "INSERT INTO active_project (project_id, activated_at) VALUES (?1, ?2)",
        rusqlite::params![project_id, stamp],
    )?;
    conn.execute(
        "UPDATE projects SET first_activated_at = COALESCE(first_activated_at, ?1) WHERE id = ?2",
        rusqlite::params![stamp, project_id],
    )?;
    Ok(())
}

fn clear_active(conn: &Connection) -> Result<()> {
    conn.execute("DELETE FROM active_project", [])?;
    Ok(())
}

/// Bump a project's last activity.
pub(crate) fn touch(conn: &Connection, project_id: i64, stamp: NaiveDateTime) -> Result<()> {
    conn.execute(
        "UPDATE projects SET last_activity_at = ?1 WHERE id = ?2",
        rusqlite::params![stamp, project_id],
    )?;
    Ok(())
}

fn count_open(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM projects WHERE is_closed = 0", [], |row| row.get(0))?;
    Ok(count)
}

/// First open project by name other than `excluded`.
fn first_other_open(conn: &Connection, excluded: i64) -> Result<Option<Project>> {
    let id: Option<i64> = conn
        .query_row(
            "SELECT id FROM projects WHERE is_closed = 0 AND id != ?1 ORDER BY name LIMIT 1",
            [excluded],
            |row| row.get(0),
        )
        .optional()?;
    id.map(|id| get_by_id(conn, id)).transpose()
}

/// Move the pointer off `leaving`: to `home` if it is open, else the first other
/// open project by name, else nowhere. Callers own the transaction.
fn hand_off(
    conn: &Connection,
    leaving: &Project,
    stamp: NaiveDateTime,
    events: &mut Vec<ProjectEvent>,
) -> Result<()> {
    events.push(ProjectEvent::Deactivated(leaving.name.clone()));

    let home = find_by_name(conn, HOME_PROJECT)?.filter(|home| !home.is_closed && home.id != leaving.id);
    let fallback = match home {
        Some(home) => Some(home),
        None => first_other_open(conn, leaving.id)?,
    };

    match fallback {
        Some(next) => {
            set_active(conn, next.id, stamp)?;
            events.push(ProjectEvent::Activated(next.name));
        }
        None => {
            log::warn!("'{}' leaves no open project to activate", leaving.name);
            clear_active(conn)?;
        }
    }
    Ok(())
}

impl Database {
    /// Create a new, open, inactive project.
    pub fn create_project(&self, name: &str, tags: &[String]) -> Result<Vec<ProjectEvent>> {
        validate_project_name(name)?;

        let tx = self.conn.unchecked_transaction()?;
        if find_by_name(&tx, name)?.is_some() {
            return Err(ConflictError::ProjectExists(name.to_string()).into());
        }
        tx.execute(
            "INSERT INTO projects (name, created_at, is_closed) VALUES (?1, ?2, 0)",
            rusqlite::params![name, now()],
        )?;
        let id = tx.last_insert_rowid();
        tags::add_all(&tx, TagTarget::Project, id, tags)?;
        let project = get_by_id(&tx, id)?;
        tx.commit()?;

        log::info!("created project '{name}'");
        Ok(vec![ProjectEvent::Created(project)])
    }

    pub fn get_project(&self, name: &str) -> Result<Project> {
        get_by_name(&self.conn, name)
    }

    pub fn get_project_by_id(&self, id: i64) -> Result<Project> {
        get_by_id(&self.conn, id)
    }

    /// The project new notes and todos are filed under.
    pub fn active_project(&self) -> Result<Project> {
        let id = active_id(&self.conn)?
            .ok_or_else(|| DatabaseError::not_found(EntityKind::ActiveProject, ""))?;
        get_by_id(&self.conn, id)
    }

    pub fn project_state(&self, project: &Project) -> Result<ProjectState> {
        if project.is_closed {
            return Ok(ProjectState::Closed);
        }
        Ok(match active_id(&self.conn)? {
            Some(id) if id == project.id => ProjectState::OpenActive,
            _ => ProjectState::OpenInactive,
        })
    }

    /// Projects ordered by name; closed ones only when asked for.
    pub fn list_projects(&self, include_closed: bool) -> Result<Vec<Project>> {
        let mut sql = format!("SELECT {PROJECT_COLUMNS} FROM projects");
        if !include_closed {
            sql.push_str(" WHERE is_closed = 0");
        }
        sql.push_str(" ORDER BY name");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut projects = stmt
            .query_map([], row_to_project)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        for project in &mut projects {
            project.tags = tags::tags_of(&self.conn, TagTarget::Project, project.id)?;
        }
        Ok(projects)
    }

    pub fn count_open_projects(&self) -> Result<i64> {
        count_open(&self.conn)
    }

    pub fn touch_project(&self, project_id: i64) -> Result<()> {
        touch(&self.conn, project_id, now())
    }

    /// Make `name` the active project. Activating the current one is a no-op.
    pub fn activate_project(&self, name: &str) -> Result<Vec<ProjectEvent>> {
        let tx = self.conn.unchecked_transaction()?;
        let target = get_by_name(&tx, name)?;
        if target.is_closed {
            return Err(ConflictError::ProjectClosed(name.to_string()).into());
        }

        let mut events = Vec::new();
        match active_id(&tx)? {
            Some(id) if id == target.id => return Ok(events),
            Some(id) => events.push(ProjectEvent::Deactivated(get_by_id(&tx, id)?.name)),
            None => {}
        }

        set_active(&tx, target.id, now())?;
        tx.commit()?;

        log::info!("activated project '{name}'");
        events.push(ProjectEvent::Activated(target.name));
        Ok(events)
    }

    /// Close a project, handing the active pointer to `home` or another open project.
    pub fn close_project(&self, name: &str) -> Result<Vec<ProjectEvent>> {
        let tx = self.conn.unchecked_transaction()?;
        let project = get_by_name(&tx, name)?;
        if project.is_closed {
            return Err(ConflictError::AlreadyClosed(name.to_string()).into());
        }

        let open_todos = count_incomplete_tagged(&tx, name)?;
        if open_todos > 0 {
            return Err(ConflictError::IncompleteTodos { project: name.to_string(), count: open_todos }.into());
        }
        if project.is_home() && count_open(&tx)? == 1 {
            return Err(ConflictError::LastOpenHome.into());
        }

        let mut events = Vec::new();
        let stamp = now();

        if active_id(&tx)? == Some(project.id) {
            hand_off(&tx, &project, stamp, &mut events)?;
        }

        tx.execute(
            "UPDATE projects SET is_closed = 1, closed_at = ?1 WHERE id = ?2",
            rusqlite::params![stamp, project.id],
        )?;
        tx.commit()?;

        log::info!("closed project '{name}'");
        events.push(ProjectEvent::Closed(project.name));
        Ok(events)
    }

    /// Reopen a closed project. It stays inactive; reopening an open project does nothing.
    pub fn reopen_project(&self, name: &str) -> Result<Vec<ProjectEvent>> {
        let tx = self.conn.unchecked_transaction()?;
        let project = get_by_name(&tx, name)?;
        if !project.is_closed {
            return Ok(Vec::new());
        }
        tx.execute(
            "UPDATE projects SET is_closed = 0, closed_at = NULL WHERE id = ?1",
            [project.id],
        )?;
        tx.commit()?;

        log::info!("reopened project '{name}'");
        Ok(vec![ProjectEvent::Reopened(project.name)])
    }

    /// Delete a project. `home` is never deletable; deleting the active one hands
    /// the pointer to `home`, or another open project when `home` is closed.
    pub fn delete_project(&self, name: &str) -> Result<Vec<ProjectEvent>> {
        if name == HOME_PROJECT {
            return Err(ConflictError::DeleteHome.into());
        }

        let tx = self.conn.unchecked_transaction()?;
        let project = get_by_name(&tx, name)?;
        let mut events = Vec::new();

        if active_id(&tx)? == Some(project.id) {
            hand_off(&tx, &project, now(), &mut events)?;
        }

        tx.execute("DELETE FROM projects WHERE id = ?1", [project.id])?;
        tx.commit()?;

        log::info!("deleted project '{name}'");
        events.push(ProjectEvent::Deleted(project));
        Ok(events)
    }

    /// Replace the project's tag set.
    pub fn update_project_tags(&self, name: &str, tags: &[String]) -> Result<Vec<ProjectEvent>> {
        let tx = self.conn.unchecked_transaction()?;
        let project = get_by_name(&tx, name)?;
        tags::replace_all(&tx, TagTarget::Project, project.id, tags)?;
        let tags = tags::tags_of(&tx, TagTarget::Project, project.id)?;
        tx.commit()?;

        Ok(vec![ProjectEvent::TagsUpdated { name: project.name, tags }])
    }
}
