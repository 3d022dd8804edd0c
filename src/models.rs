use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The project every install starts with. It can never be deleted.
pub const HOME_PROJECT: &str = "home";

/// Names that collide with `note project <subcommand>`.
pub const RESERVED_PROJECT_NAMES: &[&str] = &[
    "create", "close", "reopen", "list", "status", "show", "edit", "delete",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub content: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub is_important: bool,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub content: String,
    pub is_complete: bool,
    pub due_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
    pub tags: Vec<String>,
}

impl Todo {
    /// Due strictly before `today` and still open.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.is_complete && self.due_date.is_some_and(|due| due < today)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub created_at: NaiveDateTime,
    pub first_activated_at: Option<NaiveDateTime>,
    pub last_activity_at: Option<NaiveDateTime>,
    pub closed_at: Option<NaiveDateTime>,
    pub is_closed: bool,
    pub tags: Vec<String>,
}

impl Project {
    pub fn is_home(&self) -> bool {
        self.name == HOME_PROJECT
    }
}

/// Where a project sits in the activation lifecycle. Closed implies inactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProjectState {
    OpenInactive,
    OpenActive,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// A tag together with how many notes and todos carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagUsage {
    pub tag: Tag,
    pub usage_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("project name '{0}' is reserved")]
    ReservedProjectName(String),
    #[error("project name '{0}' must be kebab-case (lowercase letters, digits and single hyphens)")]
    InvalidProjectName(String),
    #[error("tag names cannot be blank")]
    BlankTag,
    #[error(
        "Invalid date '{0}'. Use YYYY-MM-DD or: today, tomorrow, end-of-week, end-of-month, next-week, next-month"
    )]
    InvalidDate(String),
    #[error("start date {start} is after end date {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
}

/// Check a project name against the reserved list and the kebab-case shape.
pub fn validate_project_name(name: &str) -> Result<(), ValidationError> {
    if RESERVED_PROJECT_NAMES.contains(&name) {
        return Err(ValidationError::ReservedProjectName(name.to_string()));
    }
    if !is_kebab_case(name) {
        return Err(ValidationError::InvalidProjectName(name.to_string()));
    }
    Ok(())
}

fn is_kebab_case(name: &str) -> bool {
    !name.is_empty()
        && name.split('-').all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        })
}

/// Trim each tag, reject blanks and collapse duplicates keeping first-seen order.
pub fn normalize_tags<S: AsRef<str>>(names: &[S]) -> Result<Vec<String>, ValidationError> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ValidationError::BlankTag);
        }
        if !out.iter().any(|existing| existing == trimmed) {
            out.push(trimmed.to_string());
        }
    }
    Ok(out)
}
