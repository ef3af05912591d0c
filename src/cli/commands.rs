//! CLI command definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parsesmith - generate a document parser with an LLM and check it against a reference table
#[derive(Parser, Debug)]
#[command(name = "parsesmith")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output, including the per-attempt history
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate, test and correct a parser for one target
    Run {
        /// Target id, e.g. `icici`
        #[arg(short, long)]
        target: String,

        /// Override the directory holding `<target>/` input and reference files
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Override the directory the parser is written to
        #[arg(long)]
        parsers_dir: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from(["parsesmith", "run", "--target", "icici"]).unwrap();
        assert!(!cli.is_verbose());
        match cli.command {
            Commands::Run {
                target,
                data_dir,
                parsers_dir,
            } => {
                assert_eq!(target, "icici");
                assert!(data_dir.is_none());
                assert!(parsers_dir.is_none());
            }
        }
    }

    #[test]
    fn test_parse_global_flags_and_overrides() {
        let cli = Cli::try_parse_from([
            "parsesmith",
            "run",
            "-t",
            "sbi",
            "-v",
            "-c",
            "custom.yml",
            "--data-dir",
            "/srv/data",
            "--parsers-dir",
            "out",
        ])
        .unwrap();
        assert!(cli.is_verbose());
        assert_eq!(cli.config, Some(PathBuf::from("custom.yml")));
        let Commands::Run {
            data_dir, parsers_dir, ..
        } = cli.command;
        assert_eq!(data_dir, Some(PathBuf::from("/srv/data")));
        assert_eq!(parsers_dir, Some(PathBuf::from("out")));
    }

    #[test]
    fn test_target_is_required() {
        assert!(Cli::try_parse_from(["parsesmith", "run"]).is_err());
        assert!(Cli::try_parse_from(["parsesmith"]).is_err());
    }
}
