//! CLI argument definitions for rowmap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "rowmap",
    version,
    about = "Map CSV rows into records described by a JSON rules file",
    long_about = "Map CSV rows into records described by a JSON rules file.\n\n\
                  Rules name each target property, its kind, an optional column\n\
                  alias and built-in value processors. Absent columns and empty\n\
                  cells leave properties unset unless --strict is given."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show how each configured property binds to the CSV header.
    Inspect(InspectArgs),

    /// Map every CSV row and print the resulting records.
    Map(MapArgs),
}

#[derive(Args, Clone, Debug)]
pub struct InputArgs {
    /// JSON rules file describing the target record.
    #[arg(long = "rules", value_name = "RULES_JSON")]
    pub rules: PathBuf,

    /// CSV file whose first row is the header.
    #[arg(value_name = "CSV")]
    pub input: PathBuf,

    /// Field delimiter.
    #[arg(long = "delimiter", default_value_t = ',')]
    pub delimiter: char,

    /// Keep surrounding whitespace in cells.
    #[arg(long = "no-trim")]
    pub no_trim: bool,

    /// Read empty cells as empty text instead of NULL.
    #[arg(long = "keep-empty")]
    pub keep_empty: bool,
}

#[derive(Parser, Clone, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Parser, Clone, Debug)]
pub struct MapArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Fail when a configured column is missing from the CSV header.
    #[arg(long = "strict")]
    pub strict: bool,

    /// Output format.
    #[arg(long = "format", value_enum, default_value = "json")]
    pub format: OutputFormatArg,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormatArg {
    /// One JSON object per line.
    Json,
    /// Aligned table.
    Table,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
