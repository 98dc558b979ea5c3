//! CLI argument definitions for `tariff-nav`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use tariff_cli::session::Key;

#[derive(Parser)]
#[command(
    name = "tariff-nav",
    version,
    about = "Browse, search and pick tariff classification codes",
    long_about = "Browse a section / chapter / heading / subheading classification tree,\n\
                  search it by code or description, and replay keyboard sessions\n\
                  against the lookup navigator. Recent and favorite codes persist\n\
                  between runs."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
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

    /// Navigator settings file (default: the per-user settings.toml).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// File holding recent and favorite codes (default: the per-user data dir).
    #[arg(long = "state-file", value_name = "PATH", global = true)]
    pub state_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the classification tree, optionally expanding some codes.
    Tree(TreeArgs),

    /// Search the catalog by code or description.
    Search(SearchArgs),

    /// Replay a keyboard session against the navigator.
    Session(SessionArgs),

    /// List recently selected codes.
    Recent,

    /// List favorite codes.
    Favorites,

    /// Add a code to favorites, or remove it if already there.
    Favorite(FavoriteArgs),
}

#[derive(Args)]
pub struct TreeArgs {
    /// Catalog JSON file.
    #[arg(value_name = "CATALOG")]
    pub catalog: PathBuf,

    /// Expand this code and its ancestors (repeatable).
    #[arg(long = "expand", value_name = "CODE")]
    pub expand: Vec<String>,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Catalog JSON file.
    #[arg(value_name = "CATALOG")]
    pub catalog: PathBuf,

    /// Code or description words.
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Maximum number of hits (default: search_limit from settings).
    #[arg(long = "limit", value_name = "N")]
    pub limit: Option<usize>,
}

#[derive(Args)]
pub struct SessionArgs {
    /// Catalog JSON file.
    #[arg(value_name = "CATALOG")]
    pub catalog: PathBuf,

    /// Keys: type:TEXT, wait:MS, click:N, down, up, right, left, enter, esc,
    /// back, outside.
    #[arg(value_name = "KEYS", required = true, num_args = 1..)]
    pub keys: Vec<Key>,
}

#[derive(Args)]
pub struct FavoriteArgs {
    /// Classification code to toggle.
    #[arg(value_name = "CODE")]
    pub code: String,
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
