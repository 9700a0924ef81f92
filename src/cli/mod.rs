pub mod commands;

use crate::config::{Config, OutputFormat};
use clap::{Parser, Subcommand};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "schedwatch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Record every scheduler context switch with an eBPF probe", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Attach the probe and print switch events")]
    Trace {
        #[arg(
            short,
            long,
            env = "SCHEDWATCH_DURATION",
            help = "Stop after this many seconds (default: until Ctrl-C)"
        )]
        duration: Option<u64>,

        #[arg(
            short,
            long,
            env = "SCHEDWATCH_PAGE_COUNT",
            default_value_t = 64,
            help = "Pages per CPU buffer (power of two)"
        )]
        page_count: usize,

        #[arg(
            short,
            long,
            env = "SCHEDWATCH_BATCH_SIZE",
            default_value_t = 64,
            help = "Records read per CPU per wakeup"
        )]
        batch_size: usize,

        #[arg(
            short,
            long,
            env = "SCHEDWATCH_FORMAT",
            value_enum,
            default_value_t = OutputFormat::Text,
            help = "Output format"
        )]
        format: OutputFormat,
    },
    #[command(about = "Run pre-flight checks without loading the probe")]
    Check,
}

impl Commands {
    /// Build the trace configuration; `None` for commands that don't trace.
    pub fn trace_config(&self) -> Option<Config> {
        match self {
            Commands::Trace {
                duration,
                page_count,
                batch_size,
                format,
            } => Some(Config {
                duration: duration.map(Duration::from_secs),
                page_count: *page_count,
                batch_size: *batch_size,
                format: *format,
            }),
            Commands::Check => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_defaults() {
        let cli = Cli::try_parse_from(["schedwatch", "trace"]).unwrap();
        let config = cli.command.unwrap().trace_config().unwrap();

        assert_eq!(config.duration, None);
        assert_eq!(config.page_count, 64);
        assert_eq!(config.batch_size, 64);
        assert_eq!(config.format, OutputFormat::Text);
    }

    #[test]
    fn test_trace_flags() {
        let cli = Cli::try_parse_from([
            "schedwatch",
            "-v",
            "trace",
            "--duration",
            "5",
            "--page-count",
            "8",
            "--format",
            "json",
        ])
        .unwrap();

        assert!(cli.verbose);
        let config = cli.command.unwrap().trace_config().unwrap();
        assert_eq!(config.duration, Some(Duration::from_secs(5)));
        assert_eq!(config.page_count, 8);
        assert_eq!(config.format, OutputFormat::Json);
    }

    #[test]
    fn test_check_has_no_trace_config() {
        let cli = Cli::try_parse_from(["schedwatch", "check"]).unwrap();
        assert!(cli.command.unwrap().trace_config().is_none());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
