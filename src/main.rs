mod cli;
mod commands;
mod config;
mod manifest;
mod state;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use cmakit::ClientConfig;
use config::Settings;
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub quiet: bool,
    pub manifest_path: PathBuf,
    pub state_path: PathBuf,
    settings: Settings,
    token: Option<String>,
    base_url: Option<String>,
}

impl Context {
    /// API client settings; fails when no token was given.
    pub fn client_config(&self) -> Result<ClientConfig> {
        self.settings
            .client_config(self.token.as_deref(), self.base_url.as_deref())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    if let Command::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "cmsync", &mut io::stdout());
        return Ok(());
    }

    let settings = Settings::load()?;
    let ctx = Context {
        quiet: cli.quiet,
        manifest_path: settings.manifest_path(cli.manifest.as_deref()),
        state_path: settings.state_path(cli.state.as_deref()),
        settings,
        token: cli.token,
        base_url: cli.base_url,
    };
    log::debug!(
        "Manifest {}, state {}",
        ctx.manifest_path.display(),
        ctx.state_path.display()
    );

    match cli.command {
        Command::Plan => commands::plan::run(&ctx),
        Command::Apply(args) => commands::apply::run(&ctx, args),
        Command::Refresh => commands::refresh::run(&ctx),
        Command::Destroy(args) => commands::destroy::run(&ctx, args),
        Command::Completions { .. } => Ok(()),
    }
}
