//! Tariff classification navigator CLI.

use std::io::{self, IsTerminal};

use clap::{ColorChoice, Parser};
use tariff_cli::logging::{LogConfig, LogFormat, init_logging};
use tariff_navigator::NavigatorConfig;
use tracing::level_filters::LevelFilter;

mod cli;
mod commands;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use crate::commands::{
    Context, run_favorite, run_favorites, run_recent, run_search, run_session, run_tree,
};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }

    let context = Context {
        config: match &cli.config {
            Some(path) => NavigatorConfig::load_from(path),
            None => NavigatorConfig::load(),
        },
        state_file: cli.state_file.clone(),
    };
    let result = match &cli.command {
        Command::Tree(args) => run_tree(&context, args).await,
        Command::Search(args) => run_search(&context, args),
        Command::Session(args) => run_session(&context, args).await,
        Command::Recent => run_recent(&context),
        Command::Favorites => run_favorites(&context),
        Command::Favorite(args) => run_favorite(&context, args),
    };
    let exit_code = match result {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
