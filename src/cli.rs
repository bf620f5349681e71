use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::NotifierConfig;
use crate::error::NotifierError;

/// opsnotify - staged progress banners for terminal dashboards
#[derive(Parser)]
#[command(name = "opsnotify")]
#[command(about = "Simulated staged-progress notifications for terminal dashboards")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Timing configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive banner demo (default)
    Demo,

    /// Run one scripted sequence headlessly and log published states
    Script {
        /// JSON file containing an array of steps
        #[arg(long)]
        steps: Option<PathBuf>,

        /// Use the random-increment mode instead of fixed steps
        #[arg(long)]
        random: bool,

        /// RNG seed for deterministic random runs
        #[arg(long)]
        seed: Option<u64>,
    },
}

impl Cli {
    /// Timings from `--config`, or the defaults
    pub fn notifier_config(&self) -> Result<NotifierConfig, NotifierError> {
        match &self.config {
            Some(path) => NotifierConfig::from_path(path),
            None => Ok(NotifierConfig::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_script_flags_parse() {
        let cli = Cli::parse_from(["opsnotify", "script", "--random", "--seed", "42"]);
        match cli.command {
            Some(Commands::Script { random, seed, steps }) => {
                assert!(random);
                assert_eq!(seed, Some(42));
                assert!(steps.is_none());
            }
            _ => panic!("expected script subcommand"),
        }
    }
}
