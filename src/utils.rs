use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

use crate::models::ValidationError;

/// Profile mode for the application (dev or prod)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Dev,
    Prod,
}

impl Profile {
    fn app_name(self) -> &'static str {
        match self {
            Profile::Dev => "note-dev",
            Profile::Prod => "note",
        }
    }
}

/// Get the configuration directory path.
/// The dev profile uses "note-dev" instead of "note"
pub fn get_config_dir(profile: Profile) -> Option<PathBuf> {
    ProjectDirs::from("com", "note", profile.app_name()).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the data directory path, where the database lives by default.
pub fn get_data_dir(profile: Profile) -> Option<PathBuf> {
    ProjectDirs::from("com", "note", profile.app_name()).map(|dirs| dirs.data_dir().to_path_buf())
}

/// Expand `~` in a path string to the user's home directory
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Parse a date in ISO 8601 format (YYYY-MM-DD)
pub fn parse_date(date_str: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
}

/// Resolve a date expression relative to `today`.
///
/// Accepts `today`, `tomorrow`, `end-of-week` (the next Friday strictly after
/// today), `end-of-month`, `next-week`, `next-month` and literal `YYYY-MM-DD`.
pub fn parse_date_expr(input: &str, today: NaiveDate) -> Result<NaiveDate, ValidationError> {
    let invalid = || ValidationError::InvalidDate(input.to_string());
    match input.trim() {
        "today" => Ok(today),
        "tomorrow" => today.checked_add_days(Days::new(1)).ok_or_else(invalid),
        "end-of-week" => {
            let from_friday = Weekday::Fri.num_days_from_monday() as i64;
            let current = today.weekday().num_days_from_monday() as i64;
            let mut ahead = (from_friday - current).rem_euclid(7);
            if ahead == 0 {
                ahead = 7;
            }
            today.checked_add_days(Days::new(ahead as u64)).ok_or_else(invalid)
        }
        "end-of-month" => today
            .with_day(1)
            .and_then(|first| first.checked_add_months(Months::new(1)))
            .and_then(|next| next.pred_opt())
            .ok_or_else(invalid),
        "next-week" => today.checked_add_days(Days::new(7)).ok_or_else(invalid),
        "next-month" => today.checked_add_months(Months::new(1)).ok_or_else(invalid),
        literal => parse_date(literal).map_err(|_| invalid()),
    }
}

/// Today's date on the local calendar.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // 2026-10-14 is a Wednesday
    const WEDNESDAY: (i32, u32, u32) = (2026, 10, 14);

    fn wednesday() -> NaiveDate {
        day(WEDNESDAY.0, WEDNESDAY.1, WEDNESDAY.2)
    }

    #[test]
    fn relative_keywords() {
        let today = wednesday();
        assert_eq!(parse_date_expr("today", today), Ok(today));
        assert_eq!(parse_date_expr("tomorrow", today), Ok(day(2026, 10, 15)));
        assert_eq!(parse_date_expr("next-week", today), Ok(day(2026, 10, 21)));
        assert_eq!(parse_date_expr("next-month", today), Ok(day(2026, 11, 14)));
        assert_eq!(parse_date_expr("end-of-month", today), Ok(day(2026, 10, 31)));
    }

    #[test]
    fn end_of_week_is_the_coming_friday() {
        assert_eq!(parse_date_expr("end-of-week", wednesday()), Ok(day(2026, 10, 16)));
        // on a Friday it rolls to the next one
        assert_eq!(parse_date_expr("end-of-week", day(2026, 10, 16)), Ok(day(2026, 10, 23)));
        assert_eq!(parse_date_expr("end-of-week", day(2026, 10, 17)), Ok(day(2026, 10, 23)));
        assert_eq!(parse_date_expr("end-of-week", day(2026, 10, 17)).unwrap().weekday(), Weekday::Fri);
    }

    #[test]
    fn month_arithmetic_handles_short_months() {
        assert_eq!(parse_date_expr("end-of-month", day(2028, 2, 3)), Ok(day(2028, 2, 29)));
        assert_eq!(parse_date_expr("end-of-month", day(2026, 12, 31)), Ok(day(2026, 12, 31)));
        assert_eq!(parse_date_expr("next-month", day(2026, 1, 31)), Ok(day(2026, 2, 28)));
    }

    #[test]
    fn literal_dates() {
        assert_eq!(parse_date_expr("2027-03-05", wednesday()), Ok(day(2027, 3, 5)));
    }

    #[test]
    fn anything_else_is_rejected() {
        for bad in ["", "yesterday", "2026-13-01", "03/05/2027", "Tomorrow"] {
            let err = parse_date_expr(bad, wednesday()).unwrap_err();
            assert_eq!(err, ValidationError::InvalidDate(bad.to_string()));
            assert!(err.to_string().contains("YYYY-MM-DD"));
        }
    }

    #[test]
    fn expand_path_leaves_plain_paths_alone() {
        assert_eq!(expand_path("/tmp/notes.db"), PathBuf::from("/tmp/notes.db"));
    }
}
