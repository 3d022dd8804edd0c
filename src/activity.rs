//! Audit trail: every state change to a project or todo is written down as a
//! plain note tagged with the entity kind and the verb.

use crate::database::{Database, DatabaseError, ProjectEvent};
use crate::models::{Note, Todo};

/// A user-observable change to a todo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoEvent {
    Created(Todo),
    Updated { todo: Todo, changes: Vec<String> },
    Completed(Todo),
    Uncompleted(Todo),
    Deleted(Todo),
}

/// Writes audit notes. Borrowing the database keeps it usable after a
/// transition has committed.
pub struct ActivityLog<'a> {
    db: &'a Database,
}

impl<'a> ActivityLog<'a> {
    pub fn new(db: &'a Database) -> Self {
        ActivityLog { db }
    }

    fn write(&self, content: String, mut tags: Vec<String>, extra: &[String]) -> Result<Note, DatabaseError> {
        tags.extend(extra.iter().cloned());
        self.db.create_note(&content, &tags, false)
    }

    /// Record one project event. Creation and deletion carry the project's tags.
    pub fn project(&self, event: &ProjectEvent) -> Result<Note, DatabaseError> {
        let base = |verb: &str| vec!["project".to_string(), verb.to_string()];
        match event {
            ProjectEvent::Created(project) => self.write(
                format!("Created project: {}", project.name),
                base("create"),
                &project.tags,
            ),
            ProjectEvent::Activated(name) => {
                self.write(format!("Activated project: {name}"), base("activate"), &[])
            }
            ProjectEvent::Deactivated(name) => {
                self.write(format!("Deactivated project: {name}"), base("deactivate"), &[])
            }
            ProjectEvent::TagsUpdated { name, tags } => {
                let formatted: Vec<String> = tags.iter().map(|t| format!("#{t}")).collect();
                self.write(
                    format!("Updated project: {name} - Updated tags to {}", formatted.join(" ")),
                    base("update"),
                    &[],
                )
            }
            ProjectEvent::Closed(name) => self.write(format!("Closed project: {name}"), base("close"), &[]),
            ProjectEvent::Reopened(name) => {
                self.write(format!("Reopened project: {name}"), base("reopen"), &[])
            }
            ProjectEvent::Deleted(project) => self.write(
                format!("Deleted project: {}", project.name),
                base("delete"),
                &project.tags,
            ),
        }
    }

    /// Record one todo event. Everything but edits carries the todo's own tags.
    pub fn todo(&self, event: &TodoEvent) -> Result<Note, DatabaseError> {
        let base = |verb: &str| vec!["todo".to_string(), verb.to_string()];
        let describe = |verb: &str, todo: &Todo| match todo.due_date {
            Some(due) => format!("{verb} todo: {} (due: {})", todo.content, due.format("%Y-%m-%d")),
            None => format!("{verb} todo: {}", todo.content),
        };
        match event {
            TodoEvent::Created(todo) => self.write(describe("Created", todo), base("create"), &todo.tags),
            TodoEvent::Updated { changes, .. } => {
                self.write(format!("Updated todo: {}", changes.join(", ")), base("update"), &[])
            }
            TodoEvent::Completed(todo) => {
                self.write(describe("Completed", todo), base("complete"), &todo.tags)
            }
            TodoEvent::Uncompleted(todo) => {
                self.write(describe("Uncompleted", todo), base("uncomplete"), &todo.tags)
            }
            TodoEvent::Deleted(todo) => self.write(describe("Deleted", todo), base("delete"), &todo.tags),
        }
    }

    /// Record events in order, stopping at the first failure.
    pub fn projects(&self, events: &[ProjectEvent]) -> Result<(), DatabaseError> {
        for event in events {
            self.project(event)?;
        }
        Ok(())
    }
}
