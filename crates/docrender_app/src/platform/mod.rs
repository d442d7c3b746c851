//! Terminal front end: wires the pure session core to the engine.
mod app;
mod cli;
mod config;
mod effects;
mod logging;
mod ui;

use std::process::ExitCode;

use clap::Parser;
use docrender_logging::docrender_error;

use cli::{Cli, Command};

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let mut config = match config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    config.apply_overrides(&cli);
    logging::initialize(config.log_destination);

    let result = match cli.command.unwrap_or(Command::Session) {
        Command::Session => app::run_session(&config).map(|()| ExitCode::SUCCESS),
        Command::Render { path, template } => {
            app::run_render_once(&config, &path, template).map(|succeeded| {
                if succeeded {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::FAILURE
                }
            })
        }
        Command::Templates => app::run_list_templates(&config).map(|()| ExitCode::SUCCESS),
    };

    result.unwrap_or_else(|err| {
        docrender_error!("{:#}", err);
        eprintln!("error: {err:#}");
        ExitCode::FAILURE
    })
}
