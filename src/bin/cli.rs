//! OpenSSF Scorecard Monitor CLI
//!
//! Local execution entry point, meant to be invoked by a scheduler such as
//! a CI cron job.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use scorecard_monitor::{
    error::{AppError, Result},
    models::Config,
    pipeline::{self, Services},
    services::{GitCli, GithubClient, IssueTracker, RepositoryDiscovery, ScorecardClient, VersionControl},
    storage::{LocalStorage, MonitorStorage},
};

/// scorecard-monitor - track OpenSSF Scorecard results over time
#[derive(Parser, Debug)]
#[command(name = "scorecard-monitor", version, about = "OpenSSF Scorecard Monitor")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "scorecard-monitor.toml")]
    config: PathBuf,

    /// Directory the scope, database and report paths are relative to
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Scope document (overrides config)
    #[arg(long, global = true)]
    scope: Option<String>,

    /// Database document (overrides config)
    #[arg(long, global = true)]
    database: Option<String>,

    /// Report document (overrides config)
    #[arg(long, global = true)]
    report: Option<String>,

    /// Maximum concurrent score requests (overrides config)
    #[arg(long, global = true)]
    max_request_in_parallel: Option<usize>,

    /// GitHub token for issues, pushes and auto scope (overrides config)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, global = true)]
    github_token: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch scores, update the database and report, publish changes
    Run,

    /// Validate configuration, scope and database without fetching
    Validate,

    /// Show the stored score of every repository
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Apply command-line overrides on top of the file configuration.
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(scope) = &cli.scope {
        config.paths.scope = scope.clone();
    }
    if let Some(database) = &cli.database {
        config.paths.database = database.clone();
    }
    if let Some(report) = &cli.report {
        config.paths.report = report.clone();
    }
    if let Some(max) = cli.max_request_in_parallel {
        config.scorecard.max_request_in_parallel = max;
    }
    if let Some(token) = &cli.github_token {
        config.github.token = Some(token.clone());
    }
}

async fn run(config: &Config, storage: &LocalStorage) -> Result<()> {
    let fetcher = ScorecardClient::new(&config.scorecard)?;

    let github = match config.github_token() {
        Some(token) => Some(GithubClient::new(config, &token)?),
        None => None,
    };

    let mut git = GitCli::new(storage.root_dir(), config.git.clone());
    if let (Some(repository), Some(token)) = (&config.github.repository, config.github_token()) {
        git = git.with_token(repository, &token);
    }

    let services = Services {
        fetcher: &fetcher,
        discovery: github.as_ref().map(|g| g as &dyn RepositoryDiscovery),
        issues: github.as_ref().map(|g| g as &dyn IssueTracker),
        vcs: Some(&git as &dyn VersionControl),
    };

    pipeline::run_monitor(config, storage, &services).await?;
    Ok(())
}

async fn validate(config: &Config, storage: &LocalStorage) -> Result<()> {
    config.validate()?;
    log::info!("✓ Config OK");

    let scope = storage.load_scope().await?;
    log::info!("✓ Scope OK ({} repositories)", scope.len());

    let database = storage.load_database().await?;
    log::info!("✓ Database OK ({} repositories)", database.len());

    let missing = scope.iter().filter(|id| database.get(id).is_none()).count();
    if missing > 0 {
        log::info!("{} repositories in scope have no recorded score yet", missing);
    }
    Ok(())
}

async fn info(storage: &LocalStorage) -> Result<()> {
    let database = storage.load_database().await?;
    if database.is_empty() {
        log::info!("No scores recorded yet.");
        return Ok(());
    }

    for (id, history) in database.iter() {
        match &history.current {
            Some(current) => log::info!(
                "{}: {:.1} ({}), {} earlier snapshots",
                id,
                current.score,
                current.date,
                history.previous.len()
            ),
            None => log::info!("{}: no current score", id),
        }
    }
    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        log::warn!(
            "Config not found at {}. Using defaults.",
            cli.config.display()
        );
        Config::default()
    };
    apply_overrides(&mut config, &cli);

    let storage = LocalStorage::new(&cli.root, config.paths.clone());

    let outcome = match cli.command {
        Command::Run => run(&config, &storage).await,
        Command::Validate => validate(&config, &storage).await,
        Command::Info => info(&storage).await,
    };

    if let Err(e) = &outcome {
        let phase = match e {
            AppError::Config(_) | AppError::Validation(_) | AppError::Toml(_) => "configuration",
            AppError::Fetch { .. } | AppError::Http(_) => "fetch",
            AppError::Splice(_) => "report splicing",
            AppError::Git { .. } => "commit/push",
            AppError::GitHub(_) => "GitHub API",
            _ => "run",
        };
        log::error!("Scorecard monitor failed during {}: {}", phase, e);
    }
    outcome
}
