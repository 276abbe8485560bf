use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Eisenhower-matrix task manager with priority suggestions and recurring tasks.
/// Storage defaults to tasks.json in the platform data directory.
#[derive(Parser)]
#[command(name = "prio", version, about = "Prioritised task management CLI")]
pub struct Cli {
    /// Path to the JSON database file.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Path to the TOML configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["prio", "list", "--db", "/tmp/x.json", "--all"]).unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.json")));
        assert!(matches!(cli.command, Commands::List { all: true, .. }));
    }
}
