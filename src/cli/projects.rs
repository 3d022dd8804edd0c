use clap::{Args, Subcommand};

use super::{CliError, print_help, print_output, report_activity};
use crate::activity::ActivityLog;
use crate::database::{ConflictError, Database, DatabaseError, ErrorKind, ProjectEvent};
use crate::display;

#[derive(Args)]
pub struct ProjectArgs {
    #[command(subcommand)]
    pub command: Option<ProjectCommand>,

    /// Project to make active
    pub name: Option<String>,
}

#[derive(Subcommand)]
pub enum ProjectCommand {
    /// Create a new project
    Create {
        name: String,
        #[arg(long = "tag", value_delimiter = ',')]
        tags: Vec<String>,
    },
    /// Close a project; all its todos must be complete
    Close { name: String },
    /// Reopen a closed project
    Reopen { name: String },
    /// List projects
    List {
        /// Include closed projects
        #[arg(long)]
        all: bool,
    },
    /// Show progress for a project (the active one by default)
    Status {
        name: Option<String>,
        /// Include completed todos
        #[arg(long)]
        all: bool,
    },
    /// Show project details
    Show { name: String },
    /// Replace a project's tags
    Edit {
        name: String,
        #[arg(long = "tag", value_delimiter = ',', required = true)]
        tags: Vec<String>,
    },
    /// Delete a project
    Delete { name: String },
}

pub fn run(args: ProjectArgs, db: &Database) -> Result<(), CliError> {
    match args.command {
        None => match args.name {
            Some(name) => handle_activate(&name, db),
            None => print_help(Some("project")),
        },
        Some(ProjectCommand::Create { name, tags }) => handle_create(&name, &tags, db),
        Some(ProjectCommand::Close { name }) => handle_close(&name, db),
        Some(ProjectCommand::Reopen { name }) => handle_reopen(&name, db),
        Some(ProjectCommand::List { all }) => handle_list(all, db),
        Some(ProjectCommand::Status { name, all }) => handle_status(name.as_deref(), all, db),
        Some(ProjectCommand::Show { name }) => handle_show(&name, db),
        Some(ProjectCommand::Edit { name, tags }) => handle_edit(&name, &tags, db),
        Some(ProjectCommand::Delete { name }) => handle_delete(&name, db),
    }
}

fn record(db: &Database, events: &[ProjectEvent]) {
    report_activity(ActivityLog::new(db).projects(events));
}

pub fn handle_activate(name: &str, db: &Database) -> Result<(), CliError> {
    let events = db.activate_project(name)?;
    if events.is_empty() {
        println!("Project '{name}' is already active");
        return Ok(());
    }
    println!("Switched to project '{name}'");
    record(db, &events);
    Ok(())
}

pub fn handle_create(name: &str, tags: &[String], db: &Database) -> Result<(), CliError> {
    let events = db.create_project(name, tags)?;
    println!("Project '{name}' created");
    record(db, &events);
    Ok(())
}

/// Handle `note project close`. A refusal over open todos lists them before failing.
pub fn handle_close(name: &str, db: &Database) -> Result<(), CliError> {
    match db.close_project(name) {
        Ok(events) => {
            if let Some(ProjectEvent::Activated(next)) =
                events.iter().find(|e| matches!(e, ProjectEvent::Activated(_)))
            {
                println!("Active project is now '{next}'");
            }
            println!("Project '{name}' closed");
            record(db, &events);
            Ok(())
        }
        Err(DatabaseError::Conflict(ConflictError::IncompleteTodos { project, count })) => {
            let todos = db.incomplete_todos_for_project(&project)?;
            println!("Incomplete Tasks:");
            println!("{}", display::format_incomplete_todos(&todos));
            println!("\nComplete all todos before closing the project.");
            Err(DatabaseError::Conflict(ConflictError::IncompleteTodos { project, count }).into())
        }
        Err(err) => Err(err.into()),
    }
}

pub fn handle_reopen(name: &str, db: &Database) -> Result<(), CliError> {
    let events = db.reopen_project(name)?;
    if events.is_empty() {
        println!("Project '{name}' is already open");
        return Ok(());
    }
    println!("Project '{name}' reopened");
    record(db, &events);
    Ok(())
}

pub fn handle_list(include_closed: bool, db: &Database) -> Result<(), CliError> {
    let projects = db.list_projects(include_closed)?;
    let active_id = match db.active_project() {
        Ok(project) => Some(project.id),
        Err(err) if err.kind() == ErrorKind::NotFound => None,
        Err(err) => return Err(err.into()),
    };
    print_output(&display::format_project_list(&projects, active_id, include_closed));
    Ok(())
}

pub fn handle_status(name: Option<&str>, show_all: bool, db: &Database) -> Result<(), CliError> {
    let project = match name {
        Some(name) => db.get_project(name)?,
        None => db.active_project()?,
    };
    let incomplete = db.incomplete_todos_for_project(&project.name)?;
    let complete = db.complete_todos_for_project(&project.name)?;
    println!("{}", display::format_project_status(&project, &incomplete, &complete, show_all));
    Ok(())
}

pub fn handle_show(name: &str, db: &Database) -> Result<(), CliError> {
    let project = db.get_project(name)?;
    println!("{}", display::format_project(&project));
    Ok(())
}

pub fn handle_edit(name: &str, tags: &[String], db: &Database) -> Result<(), CliError> {
    let events = db.update_project_tags(name, tags)?;
    println!("Project '{name}' updated");
    record(db, &events);
    Ok(())
}

pub fn handle_delete(name: &str, db: &Database) -> Result<(), CliError> {
    let events = db.delete_project(name)?;
    println!("Project '{name}' deleted");
    record(db, &events);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::{Cli, Commands};
    use super::*;
    use crate::query::NoteQuery;
    use clap::Parser;

    #[test]
    fn bare_name_activates() {
        let cli = Cli::try_parse_from(["note", "project", "launch"]).unwrap();
        match cli.command {
            Some(Commands::Project(args)) => {
                assert!(args.command.is_none());
                assert_eq!(args.name.as_deref(), Some("launch"));
            }
            _ => panic!("expected project"),
        }
    }

    #[test]
    fn edit_requires_tags() {
        assert!(Cli::try_parse_from(["note", "project", "edit", "launch"]).is_err());
    }

    #[test]
    fn refused_close_keeps_project_open() {
        let db = Database::open_in_memory().unwrap();
        db.create_project("launch", &[]).unwrap();
        db.create_todo("Ship v1", &["launch".to_string()], None).unwrap();

        let err = handle_close("launch", &db).unwrap_err();
        match err {
            CliError::DatabaseError(err) => assert_eq!(err.kind(), ErrorKind::Conflict),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!db.get_project("launch").unwrap().is_closed);
    }

    #[test]
    fn create_then_switch_writes_the_trail() {
        let db = Database::open_in_memory().unwrap();
        handle_create("launch", &["work".to_string()], &db).unwrap();
        handle_activate("launch", &db).unwrap();
        handle_activate("launch", &db).unwrap();

        assert_eq!(db.active_project().unwrap().name, "launch");
        let activations = db.list_notes(&NoteQuery::default().with_tags(["project", "activate"])).unwrap();
        assert_eq!(activations.len(), 1);
        let created = db.list_notes(&NoteQuery::default().with_tags(["project", "create", "work"])).unwrap();
        assert_eq!(created[0].content, "Created project: launch");
    }
}
