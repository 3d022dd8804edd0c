use clap::Parser;
use color_eyre::Result;
use note::{Config, Database, Profile, cli::Cli};

fn main() -> Result<()> {
    // Set up error reporting with color-eyre
    color_eyre::install()?;

    let cli = Cli::parse();

    // Determine profile: --dev flag enables dev mode, otherwise use prod
    let profile = if cli.dev { Profile::Dev } else { Profile::Prod };

    let config = match &cli.config {
        Some(path) => Config::load_from(&note::utils::expand_path(path), profile)?,
        None => Config::load_with_profile(profile)?,
    };

    // RUST_LOG wins over the config file; --verbose wins over both
    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_level.as_str()));
    if cli.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    let db_path = config.get_database_path();
    log::debug!("using database {}", db_path.display());
    let db = Database::new(&db_path)?;

    note::cli::run(cli, &db, &config)?;

    Ok(())
}
