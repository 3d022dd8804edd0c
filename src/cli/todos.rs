use clap::{Args, Subcommand};

use super::{CliError, parse_date_arg, print_help, print_json, print_output, report_activity};
use crate::activity::{ActivityLog, TodoEvent};
use crate::database::{Database, DueChange, TodoUpdate};
use crate::display;
use crate::query::TodoQuery;
use crate::utils;

#[derive(Args)]
pub struct TodoArgs {
    #[command(subcommand)]
    pub command: Option<TodoCommand>,

    /// Todo content; files a todo under the active project
    pub content: Option<String>,

    #[arg(long = "tag", value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Due date (YYYY-MM-DD or today, tomorrow, end-of-week, ...)
    #[arg(long)]
    pub due: Option<String>,
}

#[derive(Subcommand)]
pub enum TodoCommand {
    /// Create a new todo
    Add {
        content: String,
        #[arg(long = "tag", value_delimiter = ',')]
        tags: Vec<String>,
        #[arg(long)]
        due: Option<String>,
    },
    /// List todos grouped by due date
    List {
        /// Only complete todos
        #[arg(long)]
        complete: bool,
        /// Only incomplete todos
        #[arg(long)]
        incomplete: bool,
        /// Only incomplete todos due before today
        #[arg(long)]
        overdue: bool,
        /// Only todos carrying every given tag
        #[arg(long = "tag", value_delimiter = ',')]
        tags: Vec<String>,
        #[arg(long)]
        json: bool,
    },
    /// Edit a todo
    Edit {
        id: i64,
        #[arg(long)]
        content: Option<String>,
        /// Replace the todo's tags
        #[arg(long = "tag", value_delimiter = ',')]
        tags: Vec<String>,
        /// New due date; an empty value removes it
        #[arg(long)]
        due: Option<String>,
    },
    /// Delete a todo
    Delete { id: i64 },
    /// Show a todo
    Show { id: i64 },
    /// Mark a todo as complete
    Complete { id: i64 },
    /// Mark a todo as incomplete
    Uncomplete { id: i64 },
}

pub fn run(args: TodoArgs, db: &Database) -> Result<(), CliError> {
    match args.command {
        None => match args.content {
            Some(content) => handle_add(&content, &args.tags, args.due.as_deref(), db),
            None => print_help(Some("todo")),
        },
        Some(TodoCommand::Add { content, tags, due }) => handle_add(&content, &tags, due.as_deref(), db),
        Some(TodoCommand::List { complete, incomplete, overdue, tags, json }) => {
            let mut query = TodoQuery::new(utils::today()).with_tags(tags);
            if complete {
                query = query.complete();
            }
            if incomplete {
                query = query.incomplete();
            }
            if overdue {
                query = query.overdue();
            }
            handle_list(&query, json, db)
        }
        Some(TodoCommand::Edit { id, content, tags, due }) => handle_edit(id, content, tags, due, db),
        Some(TodoCommand::Delete { id }) => handle_delete(id, db),
        Some(TodoCommand::Show { id }) => handle_show(id, db),
        Some(TodoCommand::Complete { id }) => handle_complete(id, db),
        Some(TodoCommand::Uncomplete { id }) => handle_uncomplete(id, db),
    }
}

/// Handle `note todo add`: the active project's name is added to the tags.
pub fn handle_add(content: &str, tags: &[String], due: Option<&str>, db: &Database) -> Result<(), CliError> {
    let due_date = due.map(|d| parse_date_arg(d, utils::today())).transpose()?;
    let project = db.active_project()?;
    let todo = db.create_todo_in_project(&project, content, tags, due_date)?;
    println!("Todo created (ID: {})", todo.id);

    report_activity(ActivityLog::new(db).todo(&TodoEvent::Created(todo)));
    Ok(())
}

pub fn handle_list(query: &TodoQuery, json: bool, db: &Database) -> Result<(), CliError> {
    let todos = db.list_todos(query)?;
    if json {
        return print_json(&todos);
    }
    print_output(&display::format_todo_list(&todos, query.today));
    Ok(())
}

/// Handle `note todo edit`. `--due ""` clears the due date; an empty `--tag` list keeps tags.
pub fn handle_edit(
    id: i64,
    content: Option<String>,
    tags: Vec<String>,
    due: Option<String>,
    db: &Database,
) -> Result<(), CliError> {
    let due = match due.as_deref().map(str::trim) {
        None => DueChange::Keep,
        Some("") => DueChange::Clear,
        Some(expr) => DueChange::Set(parse_date_arg(expr, utils::today())?),
    };
    let update = TodoUpdate {
        content,
        due,
        tags: if tags.is_empty() { None } else { Some(tags) },
    };

    let todo = db.update_todo(id, &update)?;
    if update.is_empty() {
        println!("Nothing to change for todo #{}", todo.id);
        return Ok(());
    }
    println!("Todo #{} updated", todo.id);

    let changes = update.describe();
    report_activity(ActivityLog::new(db).todo(&TodoEvent::Updated { todo, changes }));
    Ok(())
}

pub fn handle_delete(id: i64, db: &Database) -> Result<(), CliError> {
    let todo = db.get_todo(id)?;
    db.delete_todo(id)?;
    println!("Todo #{id} deleted");

    report_activity(ActivityLog::new(db).todo(&TodoEvent::Deleted(todo)));
    Ok(())
}

pub fn handle_show(id: i64, db: &Database) -> Result<(), CliError> {
    let todo = db.get_todo(id)?;
    println!("{}", display::format_todo(&todo));
    Ok(())
}

pub fn handle_complete(id: i64, db: &Database) -> Result<(), CliError> {
    let todo = db.complete_todo(id)?;
    println!("Todo #{id} complete");

    report_activity(ActivityLog::new(db).todo(&TodoEvent::Completed(todo)));
    Ok(())
}

pub fn handle_uncomplete(id: i64, db: &Database) -> Result<(), CliError> {
    let todo = db.uncomplete_todo(id)?;
    println!("Todo #{id} marked incomplete");

    report_activity(ActivityLog::new(db).todo(&TodoEvent::Uncompleted(todo)));
    Ok(())
}
