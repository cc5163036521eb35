use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::store::StoreBackend;

#[derive(Parser, Debug)]
#[command(name = "job-harvester", version, about = "Collects Swiss job postings into a deduplicated record set")]
pub struct Cli {
    /// Record store backend, overrides STORE_BACKEND
    #[arg(long, global = true, value_name = "csv|sqlite")]
    pub store: Option<StoreBackend>,

    /// Sources file, overrides SOURCES_FILE
    #[arg(long, global = true, value_name = "FILE")]
    pub sources: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one harvest cycle, then exit
    Run,

    /// Harvest every CYCLE_INTERVAL_SECS until interrupted
    Schedule {
        /// Serve the HTTP API alongside the scheduler
        #[arg(long)]
        serve: bool,
    },

    /// Serve the HTTP API only
    Serve,

    /// Merge a CSV record file into the store
    Import {
        file: PathBuf,
    },

    /// Print the parsed sources file
    Sources,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_store_override() {
        let cli = Cli::parse_from(["job-harvester", "schedule", "--serve", "--store", "sqlite"]);

        assert_eq!(cli.store, Some(StoreBackend::Sqlite));
        assert!(matches!(cli.command, Command::Schedule { serve: true }));
    }

    #[test]
    fn parses_import_file() {
        let cli = Cli::parse_from(["job-harvester", "import", "old.csv"]);

        assert!(matches!(cli.command, Command::Import { file } if file == PathBuf::from("old.csv")));
        assert_eq!(cli.store, None);
    }

    #[test]
    fn rejects_unknown_backend() {
        assert!(Cli::try_parse_from(["job-harvester", "--store", "postgres", "run"]).is_err());
    }
}
