//! Plain-text rendering of already fetched records.

use chrono::NaiveDate;

use crate::models::{Note, Project, TagUsage, Todo};
use crate::query::{TodoGroupKind, group_todos};

const DATE: &str = "%Y-%m-%d";
const CLOCK: &str = "%I:%M %p";
const STAMP: &str = "%Y-%m-%d %I:%M %p";

fn hashtags(tags: &[String]) -> String {
    tags.iter().map(|t| format!("#{t}")).collect::<Vec<_>>().join(" ")
}

/// ` #a #b` or nothing.
fn tag_suffix(tags: &[String]) -> String {
    if tags.is_empty() { String::new() } else { format!(" {}", hashtags(tags)) }
}

fn tag_line(tags: &[String]) -> Option<String> {
    if tags.is_empty() {
        return None;
    }
    let joined = tags.iter().map(|t| format!("#{t}")).collect::<Vec<_>>().join(", ");
    Some(format!("Tags: {joined}"))
}

/// Notes grouped under their creation date.
pub fn format_note_list(notes: &[Note], show_ids: bool) -> String {
    let mut out = String::new();
    let mut current: Option<NaiveDate> = None;

    for note in notes {
        let date = note.created_at.date();
        if current != Some(date) {
            if current.is_some() {
                out.push('\n');
            }
            out.push_str(&format!("{}\n", date.format(DATE)));
            current = Some(date);
        }

        out.push_str("  ");
        if show_ids {
            out.push_str(&format!("[#{}] ", note.id));
        }
        out.push_str(&format!("{}  ", note.created_at.format(CLOCK)));
        if note.is_important {
            out.push_str("[!] ");
        }
        out.push_str(&note.content);
        out.push_str(&tag_suffix(&note.tags));
        out.push('\n');
    }

    out.trim_end().to_string()
}

pub fn format_note(note: &Note) -> String {
    let mut lines = vec![
        format!("ID: {}", note.id),
        format!("Created: {}", note.created_at.format(STAMP)),
        format!("Updated: {}", note.updated_at.format(STAMP)),
    ];
    if note.is_important {
        lines.push("Important: Yes".to_string());
    }
    lines.extend(tag_line(&note.tags));
    lines.push(String::new());
    lines.push(note.content.clone());
    lines.join("\n")
}

fn group_title(kind: TodoGroupKind, today: NaiveDate) -> String {
    match kind {
        TodoGroupKind::Overdue => "OVERDUE".to_string(),
        TodoGroupKind::Today => format!("TODAY ({})", today.format(DATE)),
        TodoGroupKind::Upcoming => "UPCOMING".to_string(),
        TodoGroupKind::PastDone => "DONE".to_string(),
        TodoGroupKind::NoDueDate => "NO DUE DATE".to_string(),
    }
}

fn checkbox(todo: &Todo) -> &'static str {
    if todo.is_complete { "[X]" } else { "[ ]" }
}

/// Todos bucketed into OVERDUE / TODAY / UPCOMING / DONE / NO DUE DATE.
pub fn format_todo_list(todos: &[Todo], today: NaiveDate) -> String {
    let mut sections = Vec::new();

    for group in group_todos(todos, today) {
        let mut section = group_title(group.kind, today);
        for todo in &group.todos {
            let due = match (group.kind, todo.due_date) {
                (TodoGroupKind::Today, _) => "(due today) ".to_string(),
                (TodoGroupKind::NoDueDate, _) | (_, None) => String::new(),
                (_, Some(date)) => format!("{}  ", date.format(DATE)),
            };
            section.push_str(&format!(
                "\n  {} [#{}] {}{}{}",
                checkbox(todo),
                todo.id,
                due,
                todo.content,
                tag_suffix(&todo.tags)
            ));
        }
        sections.push(section);
    }

    sections.join("\n\n")
}

pub fn format_todo(todo: &Todo) -> String {
    let mut lines = vec![
        format!("ID: {}", todo.id),
        format!("Created: {}", todo.created_at.format(STAMP)),
    ];
    if let Some(due) = todo.due_date {
        lines.push(format!("Due: {}", due.format(DATE)));
    }
    lines.push(format!("Status: {}", if todo.is_complete { "Complete" } else { "Incomplete" }));
    if let Some(done) = todo.completed_at {
        lines.push(format!("Completed: {}", done.format(STAMP)));
    }
    lines.extend(tag_line(&todo.tags));
    lines.push(String::new());
    lines.push(todo.content.clone());
    lines.join("\n")
}

/// One line per open todo, as shown when a close is refused.
pub fn format_incomplete_todos(todos: &[Todo]) -> String {
    todos
        .iter()
        .map(|todo| {
            let due = todo.due_date.map(|d| format!("{}  ", d.format(DATE))).unwrap_or_default();
            format!("  [ ] [#{}] {}{}{}", todo.id, due, todo.content, tag_suffix(&todo.tags))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// ACTIVE, OPEN and (optionally) CLOSED sections.
pub fn format_project_list(projects: &[Project], active_id: Option<i64>, include_closed: bool) -> String {
    let line = |p: &Project, marker: &str| format!("  {marker}{}{}", p.name, tag_suffix(&p.tags));

    let active: Vec<String> = projects
        .iter()
        .filter(|p| Some(p.id) == active_id)
        .map(|p| line(p, "* "))
        .collect();
    let open: Vec<String> = projects
        .iter()
        .filter(|p| Some(p.id) != active_id && !p.is_closed)
        .map(|p| line(p, ""))
        .collect();
    let closed: Vec<String> = projects
        .iter()
        .filter(|p| Some(p.id) != active_id && p.is_closed)
        .map(|p| line(p, ""))
        .collect();

    let mut sections = Vec::new();
    for (title, rows, shown) in [("ACTIVE", active, true), ("OPEN", open, true), ("CLOSED", closed, include_closed)] {
        if shown && !rows.is_empty() {
            sections.push(format!("{title}\n{}", rows.join("\n")));
        }
    }
    sections.join("\n\n")
}

fn project_header(project: &Project) -> Vec<String> {
    let mut lines = vec![format!("Project: {}", project.name)];
    lines.extend(tag_line(&project.tags));
    lines.push(format!("Status: {}", if project.is_closed { "Closed" } else { "Open" }));
    lines.push(format!("Created: {}", project.created_at.format(DATE)));
    if let Some(at) = project.first_activated_at {
        lines.push(format!("First Activated: {}", at.format(DATE)));
    }
    if let Some(at) = project.last_activity_at {
        lines.push(format!("Last Activity: {}", at.format(DATE)));
    }
    if let Some(at) = project.closed_at {
        lines.push(format!("Closed: {}", at.format(DATE)));
    }
    lines
}

pub fn format_project(project: &Project) -> String {
    project_header(project).join("\n")
}

/// Project details plus todo progress.
pub fn format_project_status(project: &Project, incomplete: &[Todo], complete: &[Todo], show_all: bool) -> String {
    let mut lines = project_header(project);

    let total = incomplete.len() + complete.len();
    let percentage = if total > 0 { complete.len() * 100 / total } else { 0 };
    lines.push(format!("Tasks: {}/{} complete ({}%)", complete.len(), total, percentage));

    if !incomplete.is_empty() {
        lines.push(String::new());
        lines.push("Incomplete Tasks:".to_string());
        lines.push(format_incomplete_todos(incomplete));
    }

    if show_all && !complete.is_empty() {
        lines.push(String::new());
        lines.push("Completed Tasks:".to_string());
        for todo in complete {
            let due = todo.due_date.map(|d| format!("(was due: {}) ", d.format(DATE))).unwrap_or_default();
            lines.push(format!("  [X] [#{}] {}{}{}", todo.id, due, todo.content, tag_suffix(&todo.tags)));
        }
    }

    lines.join("\n")
}

pub fn format_tag_list(tags: &[TagUsage]) -> String {
    tags.iter()
        .map(|usage| format!("{} ({} uses)", usage.tag.name, usage.usage_count))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Tag;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn todo(id: i64, content: &str, due: Option<NaiveDate>, done: bool, tags: &[&str]) -> Todo {
        let stamp = day(2026, 1, 1).and_hms_opt(8, 0, 0).unwrap();
        Todo {
            id,
            content: content.to_string(),
            is_complete: done,
            due_date: due,
            created_at: stamp,
            updated_at: stamp,
            completed_at: done.then_some(stamp),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn note(id: i64, content: &str, at: (i32, u32, u32, u32, u32), important: bool, tags: &[&str]) -> Note {
        let stamp = day(at.0, at.1, at.2).and_hms_opt(at.3, at.4, 0).unwrap();
        Note {
            id,
            content: content.to_string(),
            created_at: stamp,
            updated_at: stamp,
            is_important: important,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn project(id: i64, name: &str, closed: bool) -> Project {
        Project {
            id,
            name: name.to_string(),
            created_at: day(2026, 1, 1).and_hms_opt(0, 0, 0).unwrap(),
            first_activated_at: None,
            last_activity_at: None,
            closed_at: None,
            is_closed: closed,
            tags: Vec::new(),
        }
    }

    #[test]
    fn note_list_groups_by_day() {
        let notes = vec![
            note(1, "standup", (2026, 3, 2, 9, 5), false, &["work"]),
            note(2, "fixed bug", (2026, 3, 2, 14, 30), true, &[]),
            note(3, "retro", (2026, 3, 3, 16, 0), false, &["home", "work"]),
        ];
        assert_eq!(
            format_note_list(&notes, false),
            "2026-03-02\n  09:05 AM  standup #work\n  02:30 PM  [!] fixed bug\n\n2026-03-03\n  04:00 PM  retro #home #work"
        );

        let with_ids = format_note_list(&notes, true);
        assert!(with_ids.ends_with("  [#3] 04:00 PM  retro #home #work"));
    }

    #[test]
    fn todo_list_sections() {
        let today = day(2026, 10, 17);
        let todos = vec![
            todo(1, "late", Some(day(2026, 10, 1)), false, &[]),
            todo(2, "now", Some(today), false, &[]),
            todo(3, "Ship v1", Some(day(2026, 10, 18)), false, &["launch", "urgent"]),
            todo(4, "someday", None, true, &[]),
        ];
        assert_eq!(
            format_todo_list(&todos, today),
            "OVERDUE\n  [ ] [#1] 2026-10-01  late\n\n\
             TODAY (2026-10-17)\n  [ ] [#2] (due today) now\n\n\
             UPCOMING\n  [ ] [#3] 2026-10-18  Ship v1 #launch #urgent\n\n\
             NO DUE DATE\n  [X] [#4] someday"
        );
        assert_eq!(format_todo_list(&[], today), "");
    }

    #[test]
    fn finished_past_due_todos_get_their_own_section() {
        let today = day(2026, 10, 17);
        let todos = vec![todo(5, "filed taxes", Some(day(2026, 4, 15)), true, &["admin"])];
        assert_eq!(format_todo_list(&todos, today), "DONE\n  [X] [#5] 2026-04-15  filed taxes #admin");
    }

    #[test]
    fn project_list_sections() {
        let projects = vec![project(1, "home", false), project(2, "launch", false), project(3, "old", true)];
        assert_eq!(format_project_list(&projects, Some(2), false), "ACTIVE\n  * launch\n\nOPEN\n  home");
        assert!(format_project_list(&projects, Some(2), true).ends_with("CLOSED\n  old"));
    }

    #[test]
    fn status_reports_progress() {
        let launch = project(2, "launch", false);
        let open = vec![todo(1, "write docs", None, false, &["launch"])];
        let done = vec![
            todo(2, "ship", Some(day(2026, 1, 5)), true, &["launch"]),
            todo(3, "plan", None, true, &["launch"]),
        ];
        let status = format_project_status(&launch, &open, &done, true);
        assert!(status.contains("Tasks: 2/3 complete (66%)"));
        assert!(status.contains("  [ ] [#1] write docs #launch"));
        assert!(status.contains("  [X] [#2] (was due: 2026-01-05) ship #launch"));

        let brief = format_project_status(&launch, &[], &[], false);
        assert!(brief.ends_with("Tasks: 0/0 complete (0%)"));
    }

    #[test]
    fn tag_list_lines() {
        let tags = vec![
            TagUsage { tag: Tag { id: 1, name: "work".into() }, usage_count: 3 },
            TagUsage { tag: Tag { id: 2, name: "old".into() }, usage_count: 0 },
        ];
        assert_eq!(format_tag_list(&tags), "work (3 uses)\nold (0 uses)");
    }
}
