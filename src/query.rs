//! Filtered listings over notes and todos.
//!
//! Tag filters are intersections: with N distinct tags requested, an entity
//! is returned only when it carries all N. The SQL joins the tag tables once
//! and keeps groups whose distinct matching tag count equals N, so a row is
//! never duplicated by the join fan-out.

use chrono::NaiveDate;
use rusqlite::types::Value;
use serde::Serialize;

use crate::database::notes::{NOTE_COLUMNS, row_to_note};
use crate::database::tags::{TagTarget, tags_of};
use crate::database::todos::{TODO_COLUMNS, row_to_todo};
use crate::database::{Database, Result};
use crate::models::{Note, Todo, ValidationError, normalize_tags};

fn date_value(date: NaiveDate) -> Value {
    Value::Text(date.format("%Y-%m-%d").to_string())
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Filters for `note list`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub tags: Vec<String>,
    pub important: bool,
}

impl NoteQuery {
    /// Notes created on a single calendar day.
    pub fn on_day(day: NaiveDate) -> Self {
        NoteQuery { start: Some(day), end: Some(day), ..Default::default() }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn important_only(mut self) -> Self {
        self.important = true;
        self
    }

    fn build(&self) -> std::result::Result<(String, Vec<Value>), ValidationError> {
        let tags = normalize_tags(&self.tags)?;
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(ValidationError::InvertedRange { start, end });
            }
        }

        let mut sql = format!("SELECT {NOTE_COLUMNS} FROM notes n");
        let mut conditions: Vec<String> = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        if !tags.is_empty() {
            sql.push_str(
                " JOIN note_tags nt ON n.id = nt.note_id
                  JOIN tags t ON nt.tag_id = t.id",
            );
            conditions.push(format!("t.name IN ({})", placeholders(tags.len())));
            params.extend(tags.iter().cloned().map(Value::Text));
        }
        if let Some(start) = self.start {
            conditions.push("DATE(n.created_at) >= DATE(?)".to_string());
            params.push(date_value(start));
        }
        if let Some(end) = self.end {
            conditions.push("DATE(n.created_at) <= DATE(?)".to_string());
            params.push(date_value(end));
        }
        if self.important {
            conditions.push("n.is_important = 1".to_string());
        }

        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        if !tags.is_empty() {
            sql.push_str(" GROUP BY n.id HAVING COUNT(DISTINCT t.name) = ?");
            params.push(Value::Integer(tags.len() as i64));
        }
        sql.push_str(" ORDER BY n.created_at ASC, n.id ASC");

        Ok((sql, params))
    }
}

/// Filters for `todo list`. With no status flag set every todo is eligible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoQuery {
    pub tags: Vec<String>,
    pub complete: bool,
    pub incomplete: bool,
    pub overdue: bool,
    /// Calendar date the overdue filter is measured against.
    pub today: NaiveDate,
}

impl TodoQuery {
    pub fn new(today: NaiveDate) -> Self {
        TodoQuery { tags: Vec::new(), complete: false, incomplete: false, overdue: false, today }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn complete(mut self) -> Self {
        self.complete = true;
        self
    }

    pub fn incomplete(mut self) -> Self {
        self.incomplete = true;
        self
    }

    pub fn overdue(mut self) -> Self {
        self.overdue = true;
        self
    }

    fn build(&self) -> std::result::Result<(String, Vec<Value>), ValidationError> {
        let tags = normalize_tags(&self.tags)?;

        let mut sql = format!("SELECT {TODO_COLUMNS} FROM todos t");
        let mut conditions: Vec<String> = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        if !tags.is_empty() {
            sql.push_str(
                " JOIN todo_tags tt ON t.id = tt.todo_id
                  JOIN tags tg ON tt.tag_id = tg.id",
            );
            conditions.push(format!("tg.name IN ({})", placeholders(tags.len())));
            params.extend(tags.iter().cloned().map(Value::Text));
        }
        if self.complete {
            conditions.push("t.is_complete = 1".to_string());
        }
        if self.incomplete {
            conditions.push("t.is_complete = 0".to_string());
        }
        if self.overdue {
            conditions.push("t.due_date IS NOT NULL AND t.due_date < ? AND t.is_complete = 0".to_string());
            params.push(date_value(self.today));
        }

        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        if !tags.is_empty() {
            sql.push_str(" GROUP BY t.id HAVING COUNT(DISTINCT tg.name) = ?");
            params.push(Value::Integer(tags.len() as i64));
        }
        sql.push_str(" ORDER BY t.due_date IS NULL, t.due_date, t.created_at, t.id");

        Ok((sql, params))
    }
}

impl Database {
    /// Notes matching every filter, oldest first. Invalid filters fail before any SQL runs.
    pub fn list_notes(&self, query: &NoteQuery) -> Result<Vec<Note>> {
        let (sql, params) = query.build()?;
        log::debug!("note query: {sql}");

        let mut stmt = self.conn().prepare(&sql)?;
        let mut notes = stmt
            .query_map(rusqlite::params_from_iter(params.iter()), row_to_note)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        for note in &mut notes {
            note.tags = tags_of(self.conn(), TagTarget::Note, note.id)?;
        }
        Ok(notes)
    }

    /// Todos matching every filter: dated ones by due date, then undated, ties by creation.
    pub fn list_todos(&self, query: &TodoQuery) -> Result<Vec<Todo>> {
        let (sql, params) = query.build()?;
        log::debug!("todo query: {sql}");

        let mut stmt = self.conn().prepare(&sql)?;
        let mut todos = stmt
            .query_map(rusqlite::params_from_iter(params.iter()), row_to_todo)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        for todo in &mut todos {
            todo.tags = tags_of(self.conn(), TagTarget::Todo, todo.id)?;
        }
        Ok(todos)
    }
}

/// Display buckets for a todo listing, in the order they are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TodoGroupKind {
    Overdue,
    Today,
    Upcoming,
    /// Finished todos whose due date has already passed. Without this bucket
    /// they would fit none of the others and drop out of the listing.
    PastDone,
    NoDueDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TodoGroup {
    pub kind: TodoGroupKind,
    pub todos: Vec<Todo>,
}

/// Partition an already ordered listing. Empty buckets are omitted and the
/// relative order inside each bucket is preserved.
///
/// A finished todo with a past due date is neither overdue nor upcoming; it
/// goes to `PastDone` so that `todo list --complete` still shows it.
pub fn group_todos(todos: &[Todo], today: NaiveDate) -> Vec<TodoGroup> {
    let order = [
        TodoGroupKind::Overdue,
        TodoGroupKind::Today,
        TodoGroupKind::Upcoming,
        TodoGroupKind::PastDone,
        TodoGroupKind::NoDueDate,
    ];

    let classify = |todo: &Todo| match todo.due_date {
        None => TodoGroupKind::NoDueDate,
        Some(due) if due == today => TodoGroupKind::Today,
        Some(due) if due > today => TodoGroupKind::Upcoming,
        Some(_) if todo.is_complete => TodoGroupKind::PastDone,
        Some(_) => TodoGroupKind::Overdue,
    };

    order
        .into_iter()
        .filter_map(|kind| {
            let members: Vec<Todo> = todos.iter().filter(|t| classify(t) == kind).cloned().collect();
            (!members.is_empty()).then_some(TodoGroup { kind, todos: members })
        })
        .collect()
}
