//! Info command: build, repository, and deployment information.

use clap::Args;
use serde::Serialize;
use tracing::{debug, instrument};

use deploystat_core::pattern::PatternSource;
use deploystat_core::{DeployInfo, InfoRecord, Repository, render_report};

/// Arguments for the `info` subcommand.
#[derive(Args, Debug, Default)]
pub struct InfoArgs {
    // No subcommand-specific arguments; uses global --json flag
}

#[derive(Serialize)]
struct PatternInfo<'a> {
    pattern: &'a str,
    source: PatternSource,
}

#[derive(Serialize)]
struct FullInfo<'a> {
    #[serde(flatten)]
    record: &'a InfoRecord,
    classification: PatternInfo<'a>,
}

/// Print the aggregate info report.
///
/// # Arguments
/// * `global_json` - Global `--json` flag from CLI
/// * `info` - Context built at startup
#[instrument(name = "cmd_info", skip_all, fields(json_output))]
pub fn cmd_info<R: Repository>(
    _args: InfoArgs,
    global_json: bool,
    info: &DeployInfo<R>,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing info command");

    let record = info.query();

    if global_json {
        let full = FullInfo {
            record: &record,
            classification: PatternInfo {
                pattern: info.pattern().as_str(),
                source: info.pattern().source(),
            },
        };
        println!("{}", serde_json::to_string_pretty(&full)?);
    } else {
        println!("{}", render_report(&record));
    }

    Ok(())
}
