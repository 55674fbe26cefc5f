//! Command-line interface for path diagnostics.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::LoggingConfig;

/// pathcache - inspect multipath forwarding paths
#[derive(Parser, Debug)]
#[command(
    name = "pathcache",
    author,
    version,
    about = "Decode, reverse and fingerprint segment-based forwarding paths"
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Logging settings from the config file with command-line overrides applied.
    pub fn logging(&self, base: &LoggingConfig) -> LoggingConfig {
        LoggingConfig {
            level: self.log_level.clone().unwrap_or_else(|| base.level.clone()),
            color: !self.no_color && base.color,
            ..base.clone()
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decode a raw path and list the interfaces it traverses
    Decode(DecodeArgs),

    /// Reverse a raw path for the return direction
    Reverse(ReverseArgs),

    /// Show example configuration
    Config(ConfigArgs),
}

/// Decode command arguments
#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Raw path bytes as hex
    pub raw: String,

    /// Path type tag (1 = segment-based)
    #[arg(short = 't', long, default_value = "1")]
    pub path_type: u8,
}

/// Reverse command arguments
#[derive(Args, Debug)]
pub struct ReverseArgs {
    /// Raw path bytes as hex
    pub raw: String,
}

/// Config command arguments
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Write the example to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Parse hex input, tolerating whitespace and an optional `0x` prefix.
pub fn parse_hex(input: &str) -> crate::Result<Vec<u8>> {
    let cleaned: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    let cleaned = cleaned.strip_prefix("0x").unwrap_or(&cleaned);
    hex::decode(cleaned)
        .map_err(|e| crate::error::DecodeError::InvalidHex(e.to_string()).into())
}
