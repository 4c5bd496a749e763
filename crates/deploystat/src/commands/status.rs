//! Status command: is `HEAD` a deployment commit?

use std::process::ExitCode;

use anyhow::Context;
use clap::Args;
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;
use tracing::{debug, instrument};

use deploystat_core::pattern::PatternSource;
use deploystat_core::{
    ClassificationPattern, DeployInfo, DeployStatus, DeploymentAssessment, Repository,
};

use super::paint_status;

/// Arguments for the `status` subcommand.
#[derive(Args, Debug, Default)]
pub struct StatusArgs {
    /// Classify with this pattern instead of the configured one
    #[arg(long, value_name = "REGEX")]
    pub pattern: Option<String>,

    /// Exit 1 when the status is failed and 2 when it is unknown
    #[arg(long)]
    pub exit_code: bool,
}

#[derive(Serialize)]
struct StatusReport<'a> {
    #[serde(flatten)]
    assessment: &'a DeploymentAssessment,
    pattern: &'a str,
    pattern_source: PatternSource,
}

/// Resolve the pattern for a command: an explicit flag wins over the
/// context's pattern. An invalid flag value is an error, not a fallback.
pub(crate) fn effective_pattern(
    flag: Option<&str>,
    configured: &ClassificationPattern,
) -> anyhow::Result<ClassificationPattern> {
    match flag {
        Some(raw) => ClassificationPattern::new(raw)
            .with_context(|| format!("invalid --pattern value {raw:?}")),
        None => Ok(configured.clone()),
    }
}

/// Exit code for a status under `--exit-code`.
pub(crate) const fn exit_code_for(status: DeployStatus) -> u8 {
    match status {
        DeployStatus::Success => 0,
        DeployStatus::Failed => 1,
        DeployStatus::Unknown => 2,
    }
}

/// Print the deployment status of `HEAD`.
#[instrument(name = "cmd_status", skip_all, fields(json_output, exit_code = args.exit_code))]
pub fn cmd_status<R: Repository + Clone>(
    args: StatusArgs,
    global_json: bool,
    info: &DeployInfo<R>,
) -> anyhow::Result<ExitCode> {
    let pattern = effective_pattern(args.pattern.as_deref(), info.pattern())?;
    debug!(json_output = global_json, %pattern, "executing status command");

    let assessment = info.clone().with_pattern(pattern.clone()).deployments();

    if global_json {
        let report = StatusReport {
            assessment: &assessment,
            pattern: pattern.as_str(),
            pattern_source: pattern.source(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", paint_status(assessment.status));
        if !assessment.available {
            println!(
                "{}",
                "git history unavailable".if_supports_color(Stream::Stdout, |s| s.dimmed())
            );
        }
    }

    if args.exit_code {
        Ok(ExitCode::from(exit_code_for(assessment.status)))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
