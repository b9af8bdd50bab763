//! Root CLI structure for mmd-tools

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mmd-tools")]
#[command(about = "Command-line tools for MikuMikuDance model and motion files", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Log level selected by `-v` and `-q`
    pub fn log_level(&self) -> log::LevelFilter {
        if self.quiet {
            return log::LevelFilter::Error;
        }
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// PMX and PMD model operations
    Model {
        #[command(subcommand)]
        command: crate::commands::model::ModelCommands,
    },

    /// VMD motion operations
    Motion {
        #[command(subcommand)]
        command: crate::commands::motion::MotionCommands,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_log_level_from_flags() {
        let cli = Cli::parse_from(["mmd-tools", "-vv", "completions", "bash"]);
        assert_eq!(cli.log_level(), log::LevelFilter::Debug);

        let cli = Cli::parse_from(["mmd-tools", "-q", "completions", "bash"]);
        assert_eq!(cli.log_level(), log::LevelFilter::Error);

        let cli = Cli::parse_from(["mmd-tools", "completions", "zsh"]);
        assert_eq!(cli.log_level(), log::LevelFilter::Warn);
    }
}
