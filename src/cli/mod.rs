use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use thiserror::Error;

use crate::config::Config;
use crate::database::{Database, DatabaseError};
use crate::models::ValidationError;
use crate::utils::parse_date_expr;

pub mod notes;
pub mod projects;
pub mod todos;

#[derive(Parser)]
#[command(name = "note")]
#[command(about = "Capture notes and todos, organised by project")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Use development mode (uses separate dev config/database)
    #[arg(long, global = true)]
    pub dev: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Note content; files a note under the active project
    pub content: Option<String>,

    /// Tags for the note (repeatable or comma-separated)
    #[arg(long = "tag", value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Mark the note as important
    #[arg(long)]
    pub important: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new note
    Add {
        content: String,
        #[arg(long = "tag", value_delimiter = ',')]
        tags: Vec<String>,
        #[arg(long)]
        important: bool,
    },
    /// List notes (today's by default)
    List {
        /// Start date (YYYY-MM-DD or today, tomorrow, end-of-week, ...)
        #[arg(long)]
        start: Option<String>,
        /// End date
        #[arg(long)]
        end: Option<String>,
        /// Only notes carrying every given tag
        #[arg(long = "tag", value_delimiter = ',')]
        tags: Vec<String>,
        /// Only important notes
        #[arg(long)]
        important: bool,
        #[arg(long)]
        show_ids: bool,
        #[arg(long)]
        json: bool,
    },
    /// Edit a note
    Edit {
        id: i64,
        #[arg(long)]
        content: Option<String>,
        /// Replace the note's tags
        #[arg(long = "tag", value_delimiter = ',')]
        tags: Vec<String>,
        /// Set or clear the important flag (`--important=false`)
        #[arg(long, num_args = 0..=1, default_missing_value = "true")]
        important: Option<bool>,
    },
    /// Delete a note
    Delete { id: i64 },
    /// Show a note
    Show { id: i64 },
    /// List all tags with usage counts
    Tags,
    /// Manage todos
    Todo(todos::TodoArgs),
    /// Create, list and switch between projects
    Project(projects::ProjectArgs),
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    DatabaseError(#[from] DatabaseError),
    #[error(transparent)]
    ValidationError(#[from] ValidationError),
    #[error("Failed to serialize output: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Failed to write output: {0}")]
    IoError(#[from] std::io::Error),
}

/// Dispatch a parsed command line. With neither a subcommand nor content, prints help.
pub fn run(cli: Cli, db: &Database, config: &Config) -> Result<(), CliError> {
    match cli.command {
        None => match cli.content {
            Some(content) => notes::handle_add(&content, &cli.tags, cli.important, db),
            None => print_help(None),
        },
        Some(Commands::Add { content, tags, important }) => notes::handle_add(&content, &tags, important, db),
        Some(Commands::List { start, end, tags, important, show_ids, json }) => {
            let filters = notes::ListFilters {
                start,
                end,
                tags,
                important,
                show_ids: show_ids || config.show_note_ids,
                json,
            };
            notes::handle_list(&filters, db)
        }
        Some(Commands::Edit { id, content, tags, important }) => notes::handle_edit(id, content, tags, important, db),
        Some(Commands::Delete { id }) => notes::handle_delete(id, db),
        Some(Commands::Show { id }) => notes::handle_show(id, db),
        Some(Commands::Tags) => notes::handle_tags(db),
        Some(Commands::Todo(args)) => todos::run(args, db),
        Some(Commands::Project(args)) => projects::run(args, db),
    }
}

/// Print help for the root command or one of its subcommands.
pub(crate) fn print_help(subcommand: Option<&str>) -> Result<(), CliError> {
    let mut cmd = Cli::command();
    match subcommand.and_then(|name| cmd.find_subcommand_mut(name)) {
        Some(sub) => sub.print_help()?,
        None => cmd.print_help()?,
    }
    Ok(())
}

pub(crate) fn parse_date_arg(input: &str, today: NaiveDate) -> Result<NaiveDate, CliError> {
    Ok(parse_date_expr(input, today)?)
}

/// Report an audit failure without undoing the change it describes.
pub(crate) fn report_activity<T>(result: Result<T, DatabaseError>) {
    if let Err(err) = result {
        log::warn!("failed to record activity: {err}");
        eprintln!("Warning: activity was not recorded: {err}");
    }
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print non-empty output.
pub(crate) fn print_output(output: &str) {
    if !output.is_empty() {
        println!("{output}");
    }
}
