//! # prio - Eisenhower matrix task manager
//!
//! A command-line task manager that classifies every task by urgency and
//! importance, scores open tasks by impact and closeness to their due date,
//! and highlights the top fifth as suggested work.
//!
//! ## Key Features
//!
//! - **Priority ranking**: `impact x importance weight / days until due`, with the
//!   highest-scoring tasks suggested
//! - **Eisenhower matrix**: tasks grouped into Do / Schedule / Delegate / Eliminate
//! - **Recurring tasks**: completing a daily, weekly or monthly task schedules its
//!   next occurrence; a sweep (`prio sweep` or `prio daemon`) catches up on any missed
//! - **Accounts**: several users can share one database, passwords hashed with argon2
//! - **Check-ins and reports**: weekly summary and completed-task reports
//! - **Interactive TUI**: `prio ui` opens the matrix view
//!
//! ## Quick Start
//!
//! ```bash
//! echo 's3cret' | prio register alice --name Alice
//! echo 's3cret' | prio login alice
//! prio add "Pay rent" --urgency urgent --importance important --due "end of month" --frequency monthly
//! prio list --matrix
//! prio toggle 1
//! ```
//!
//! Data is stored in `tasks.json` under the platform data directory (override with
//! `--db`); settings are read from `~/.config/prio/config.toml` (override with `--config`).

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub mod auth;
pub mod cli;
pub mod clock;
pub mod cmd;
pub mod config;
pub mod db;
pub mod error;
pub mod fields;
pub mod priority;
pub mod recurrence;
pub mod reminder;
pub mod report;
pub mod scheduler;
pub mod store;
pub mod task;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod enums;
    pub mod run;
    pub mod utils;
}

use cli::Cli;
use clock::SystemClock;
use cmd::*;
use config::{Config, LoggingConfig};

fn init_logging(config: &Config, daemon: bool) {
    let configured = &config.logging.filter;
    let fallback = if daemon && *configured == LoggingConfig::default().filter {
        "info"
    } else {
        configured.as_str()
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .init();
}

fn main() {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        cmd_completions(shell);
        return;
    }

    let config_path = cli.config.clone().unwrap_or_else(Config::default_config_path);
    let config = match Config::load_or_default(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", config_path.display());
            std::process::exit(1);
        }
    };
    init_logging(&config, matches!(cli.command, Commands::Daemon));

    let db_path = cli.db.clone().unwrap_or_else(|| default_db_path(&config));
    if let Err(e) = ensure_parent_dir(&db_path) {
        eprintln!("Failed to create data directory for {}: {e}", db_path.display());
        std::process::exit(1);
    }
    tracing::debug!(db = %db_path.display(), config = %config_path.display(), "starting");

    let ctx = Context::new(db_path, config, Arc::new(SystemClock));

    let result = match cli.command {
        Commands::Register { id, name } => cmd_register(&ctx, id, name),
        Commands::Login { id } => cmd_login(&ctx, id),
        Commands::Logout => cmd_logout(&ctx),
        Commands::Whoami => cmd_whoami(&ctx),

        Commands::Add { title, urgency, importance, due, impact, frequency } =>
            cmd_add(&ctx, title, urgency, importance, due, impact, frequency),

        Commands::List { all, sort, quadrant, matrix } => cmd_list(&ctx, all, sort, quadrant, matrix),
        Commands::Suggest => cmd_suggest(&ctx),
        Commands::View { id } => cmd_view(&ctx, id),

        Commands::Edit { id, title, urgency, importance, due, clear_due, impact, frequency } =>
            cmd_edit(&ctx, id, title, urgency, importance, due, clear_due, impact, frequency),

        Commands::Toggle { id } => cmd_toggle(&ctx, id),
        Commands::Delete { id } => cmd_delete(&ctx, id),
        Commands::Search { query } => cmd_search(&ctx, query),
        Commands::Report { start, end } => cmd_report(&ctx, start, end),
        Commands::Checkin => cmd_checkin(&ctx),
        Commands::Sweep => cmd_sweep(&ctx),
        Commands::Daemon => cmd_daemon(&ctx),
        Commands::Subscribe { endpoint } => cmd_subscribe(&ctx, endpoint),
        Commands::Unsubscribe => cmd_unsubscribe(&ctx),
        Commands::Remind => cmd_remind(&ctx),
        Commands::Ui => cmd_ui(&ctx),
        Commands::Completions { .. } => unreachable!("completions handled above"),
    };

    if let Err(e) = result {
        tracing::debug!(error = ?e, "command failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
