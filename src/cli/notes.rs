use chrono::NaiveDate;

use super::{CliError, parse_date_arg, print_json, print_output};
use crate::database::{Database, NoteUpdate};
use crate::display;
use crate::query::NoteQuery;
use crate::utils;

/// Flags of `note list`.
#[derive(Debug, Default)]
pub struct ListFilters {
    pub start: Option<String>,
    pub end: Option<String>,
    pub tags: Vec<String>,
    pub important: bool,
    pub show_ids: bool,
    pub json: bool,
}

/// Handle `note <content>` and `note add`: file a note under the active project.
pub fn handle_add(content: &str, tags: &[String], important: bool, db: &Database) -> Result<(), CliError> {
    let project = db.active_project()?;
    let note = db.create_note_in_project(&project, content, tags, important)?;
    println!("Note created (ID: {})", note.id);
    Ok(())
}

/// Turn `note list` flags into a query. Without either bound, only `today` is covered.
pub fn note_query(filters: &ListFilters, today: NaiveDate) -> Result<NoteQuery, CliError> {
    let mut query = match (&filters.start, &filters.end) {
        (None, None) => NoteQuery::on_day(today),
        (start, end) => NoteQuery {
            start: start.as_deref().map(|s| parse_date_arg(s, today)).transpose()?,
            end: end.as_deref().map(|s| parse_date_arg(s, today)).transpose()?,
            ..Default::default()
        },
    }
    .with_tags(filters.tags.iter().cloned());
    if filters.important {
        query = query.important_only();
    }
    Ok(query)
}

/// Handle `note list`.
pub fn handle_list(filters: &ListFilters, db: &Database) -> Result<(), CliError> {
    let query = note_query(filters, utils::today())?;
    let notes = db.list_notes(&query)?;
    if filters.json {
        return print_json(&notes);
    }
    print_output(&display::format_note_list(&notes, filters.show_ids));
    Ok(())
}

/// Handle `note edit`. An empty `--tag` list leaves the tags alone.
pub fn handle_edit(
    id: i64,
    content: Option<String>,
    tags: Vec<String>,
    important: Option<bool>,
    db: &Database,
) -> Result<(), CliError> {
    let update = NoteUpdate {
        content,
        important,
        tags: if tags.is_empty() { None } else { Some(tags) },
    };
    let note = db.update_note(id, &update)?;
    if update.is_empty() {
        println!("Nothing to change for note #{}", note.id);
    } else {
        println!("Note #{} updated", note.id);
    }
    Ok(())
}

pub fn handle_delete(id: i64, db: &Database) -> Result<(), CliError> {
    db.delete_note(id)?;
    println!("Note #{id} deleted");
    Ok(())
}

pub fn handle_show(id: i64, db: &Database) -> Result<(), CliError> {
    let note = db.get_note(id)?;
    println!("{}", display::format_note(&note));
    Ok(())
}

pub fn handle_tags(db: &Database) -> Result<(), CliError> {
    let tags = db.list_tags()?;
    print_output(&display::format_tag_list(&tags));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::ErrorKind;
    use chrono::Days;

    fn backdate_note(db: &Database, id: i64, day: NaiveDate) {
        let stamp = day.and_hms_opt(9, 30, 0).unwrap();
        db.conn()
            .execute("UPDATE notes SET created_at = ?1 WHERE id = ?2", rusqlite::params![stamp, id])
            .unwrap();
    }

    fn listed(db: &Database, filters: &ListFilters, today: NaiveDate) -> Vec<String> {
        let query = note_query(filters, today).unwrap();
        db.list_notes(&query).unwrap().into_iter().map(|n| n.content).collect()
    }

    #[test]
    fn unbounded_list_covers_today_only() {
        let db = Database::open_in_memory().unwrap();
        let today = utils::today();
        let yesterday = today.checked_sub_days(Days::new(1)).unwrap();

        let old = db.create_note("yesterday's note", &[], false).unwrap();
        backdate_note(&db, old.id, yesterday);
        db.create_note("today's note", &[], false).unwrap();

        let filters = ListFilters::default();
        assert_eq!(note_query(&filters, today).unwrap(), NoteQuery::on_day(today));
        assert_eq!(listed(&db, &filters, today), vec!["today's note"]);

        let start = yesterday.format("%Y-%m-%d").to_string();
        let since_yesterday = ListFilters { start: Some(start), ..Default::default() };
        assert_eq!(listed(&db, &since_yesterday, today), vec!["yesterday's note", "today's note"]);
    }

    #[test]
    fn single_bound_leaves_the_other_open() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();
        let filters = ListFilters { start: Some("tomorrow".into()), ..Default::default() };
        let query = note_query(&filters, today).unwrap();
        assert_eq!(query.start, NaiveDate::from_ymd_opt(2026, 10, 15));
        assert_eq!(query.end, None);

        let filters = ListFilters { end: Some("2026-10-01".into()), important: true, ..Default::default() };
        let query = note_query(&filters, today).unwrap();
        assert_eq!(query.start, None);
        assert_eq!(query.end, NaiveDate::from_ymd_opt(2026, 10, 1));
        assert!(query.important);
    }

    #[test]
    fn bad_bound_is_a_validation_error() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();
        let filters = ListFilters { start: Some("last-week".into()), ..Default::default() };
        assert!(matches!(note_query(&filters, today), Err(CliError::ValidationError(_))));
    }

    #[test]
    fn inverted_range_is_rejected_by_the_store() {
        let db = Database::open_in_memory().unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();
        let filters = ListFilters { start: Some("tomorrow".into()), end: Some("today".into()), ..Default::default() };
        let err = db.list_notes(&note_query(&filters, today).unwrap()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn quick_add_files_under_the_active_project() {
        let db = Database::open_in_memory().unwrap();
        handle_add("fixed bug", &["work".to_string()], false, &db).unwrap();

        let notes = db.list_notes(&NoteQuery::default().with_tags(["home", "work"])).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].tags, vec!["home", "work"]);
    }
}
