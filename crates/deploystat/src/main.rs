//! deploystat CLI
#![deny(unsafe_code)]

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use deploystat::{Cli, Commands, commands};
use deploystat_core::DeployInfo;
use deploystat_core::config::ConfigLoader;
use tracing::debug;

mod observability;

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    cli.color.apply();

    if let Some(ref dir) = cli.chdir {
        std::env::set_current_dir(dir)
            .with_context(|| format!("failed to change directory to {}", dir.display()))?;
    }

    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let cwd = camino::Utf8PathBuf::try_from(cwd).map_err(|e| {
        anyhow::anyhow!(
            "current directory is not valid UTF-8: {}",
            e.into_path_buf().display()
        )
    })?;
    let mut loader = ConfigLoader::new().with_project_search(&cwd);
    if let Some(ref config_path) = cli.config {
        let config_path = camino::Utf8PathBuf::try_from(config_path.clone()).map_err(|e| {
            anyhow::anyhow!(
                "config path is not valid UTF-8: {}",
                e.into_path_buf().display()
            )
        })?;
        loader = loader.with_file(&config_path);
    }
    let config_files = loader.sources();
    let config = loader.load().context("failed to load configuration")?;

    let env_filter = observability::env_filter(cli.quiet, cli.verbose, config.log_level.as_str());
    let log_dir = config.log_dir.as_ref().map(|dir| dir.as_std_path());
    let _guard = observability::init(log_dir, env_filter)
        .context("failed to initialize logging")?;

    debug!(
        verbose = cli.verbose,
        quiet = cli.quiet,
        json = cli.json,
        color = ?cli.color,
        chdir = ?cli.chdir,
        "CLI initialized"
    );

    // One context for the whole run; commands query it as needed.
    let info = DeployInfo::discover(&cwd, &config);

    let result = match cli.command {
        Commands::Info(args) => {
            commands::info::cmd_info(args, cli.json, &info).map(|()| ExitCode::SUCCESS)
        }
        Commands::Status(args) => commands::status::cmd_status(args, cli.json, &info),
        Commands::Deploys(args) => {
            commands::deploys::cmd_deploys(args, cli.json, &info).map(|()| ExitCode::SUCCESS)
        }
        Commands::Doctor(args) => {
            commands::doctor::cmd_doctor(args, cli.json, &config, &config_files, &cwd)
                .map(|()| ExitCode::SUCCESS)
        }
    };
    if let Err(ref err) = result {
        tracing::error!(error = %err, "fatal error");
    }
    result
}
