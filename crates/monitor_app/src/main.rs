mod app;
mod cli;
mod config;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;
use monitor_logging::monitor_error;

use cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            monitor_error!("{:#}", err);
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = config::load_config(cli.config.as_deref())?;
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        config.log_level()?
    };
    monitor_logging::initialize(&config.log_destination(), level);
    app::execute(cli.command, &config)
}
