//! CLI definitions for monitor-config.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for `dump`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DumpFormat {
    #[default]
    Yaml,
    Json,
}

/// Load, merge and inspect agent configuration files
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the main configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override a value, as dotted.path=value (repeatable)
    #[arg(short = 'o', long = "option", global = true)]
    pub options: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load the configuration and report loaded files and typed sections
    Check,

    /// Print the value at a path such as `webserver.listen_port`
    Get {
        /// Dotted, bracket-indexed path
        path: String,
    },

    /// Print the whole merged configuration
    Dump {
        #[arg(long, value_enum, default_value_t = DumpFormat::Yaml)]
        format: DumpFormat,

        /// Do not expand environment variables
        #[arg(long)]
        raw: bool,
    },
}
