//! circulis CLI - drive a circulis ring buffer from the command line.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{BenchCommand, PipeCommand};

/// circulis CLI - drive a circulis ring buffer from the command line.
///
/// Subcommands:
///   - bench: push bytes from producer threads to consumer threads
///   - pipe: copy stdin to stdout through a blocking buffer
///
/// Settings can be read from a YAML file with `-f`; flags override it.
#[derive(Parser)]
#[command(name = "circulis")]
#[command(about = "Concurrent byte ring buffer tool")]
#[command(version)]
pub struct Cli {
    /// Run configuration file (YAML)
    #[arg(short = 'f', long = "file", global = true)]
    pub file: Option<PathBuf>,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Measure producer/consumer throughput
    Bench(BenchCommand),
    /// Copy stdin to stdout through a ring buffer
    Pipe(PipeCommand),
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // stderr keeps stdout clean for `pipe`.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Bench(cmd) => cmd.run(&cli),
        Commands::Pipe(cmd) => cmd.run(&cli),
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
    fn test_parse_bench_flags() {
        let cli = Cli::try_parse_from([
            "circulis", "-v", "bench", "--capacity", "4096", "-p", "4", "--mode", "blocking",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Bench(cmd) => {
                assert_eq!(cmd.capacity, Some(4096));
                assert_eq!(cmd.producers, Some(4));
                assert_eq!(cmd.mode, Some(config::Mode::Blocking));
                assert_eq!(cmd.consumers, None);
            }
            Commands::Pipe(_) => panic!("expected bench"),
        }
    }

    #[test]
    fn test_parse_global_file_after_subcommand() {
        let cli = Cli::try_parse_from(["circulis", "pipe", "-f", "run.yaml"]).unwrap();
        assert_eq!(cli.file, Some(PathBuf::from("run.yaml")));
        assert!(matches!(cli.command, Commands::Pipe(_)));
    }
}
