pub mod activity;
pub mod cli;
pub mod config;
pub mod database;
pub mod display;
pub mod models;
pub mod query;
pub mod utils;

pub use config::Config;
pub use database::Database;
pub use models::{Note, Project, Todo};
pub use utils::Profile;
