//! Deploys command: count and list deployment commits.

use clap::Args;
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;
use tracing::{debug, instrument};

use deploystat_core::{CommitRecord, DeployInfo, DeploymentAssessment, Repository};

use super::status::effective_pattern;
use super::{heading, paint_status};

/// Time format for listed commits.
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Arguments for the `deploys` subcommand.
#[derive(Args, Debug, Default)]
pub struct DeploysArgs {
    /// Classify with this pattern instead of the configured one
    #[arg(long, value_name = "REGEX")]
    pub pattern: Option<String>,

    /// List up to N most recent deployment commits
    #[arg(long, value_name = "N")]
    pub list: Option<usize>,
}

#[derive(Serialize)]
struct DeploysReport<'a> {
    #[serde(flatten)]
    assessment: &'a DeploymentAssessment,
    pattern: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    recent: Option<&'a [CommitRecord]>,
}

/// Print the deployment count, last deploy, and optionally recent deploys.
#[instrument(name = "cmd_deploys", skip_all, fields(json_output, list = ?args.list))]
pub fn cmd_deploys<R: Repository + Clone>(
    args: DeploysArgs,
    global_json: bool,
    info: &DeployInfo<R>,
) -> anyhow::Result<()> {
    let pattern = effective_pattern(args.pattern.as_deref(), info.pattern())?;
    debug!(json_output = global_json, %pattern, "executing deploys command");

    let ctx = info.clone().with_pattern(pattern);
    let assessment = ctx.deployments();
    let recent = args
        .list
        .map(|n| ctx.recent_deployments(n).unwrap_or_default());

    if global_json {
        let report = DeploysReport {
            assessment: &assessment,
            pattern: ctx.pattern().as_str(),
            recent: recent.as_deref(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let out = Stream::Stdout;
    if !assessment.available {
        println!(
            "{}",
            "○ git history unavailable".if_supports_color(out, |s| s.yellow())
        );
    }
    println!(
        "{}: {}",
        "Deployments".if_supports_color(out, |s| s.dimmed()),
        assessment.summary.count.if_supports_color(out, |n| n.bold())
    );
    println!(
        "{}: {}",
        "Status".if_supports_color(out, |s| s.dimmed()),
        paint_status(assessment.status)
    );
    let last = "Last deploy".if_supports_color(out, |s| s.dimmed());
    match assessment.summary.last_qualifying {
        Some(ref commit) => println!(
            "{last}: {} {}",
            commit.short_hash.if_supports_color(out, |h| h.cyan()),
            commit.subject()
        ),
        None => println!("{last}: {}", "none".if_supports_color(out, |s| s.yellow())),
    }

    if let Some(ref commits) = recent {
        println!();
        println!("{}", heading("Recent deployments"));
        if commits.is_empty() {
            println!("  {}", "none".if_supports_color(out, |s| s.dimmed()));
        }
        for commit in commits {
            let when = commit.timestamp.format(TIME_FORMAT).to_string();
            println!(
                "  {} {} {}",
                commit.short_hash.if_supports_color(out, |h| h.cyan()),
                when.if_supports_color(out, |w| w.dimmed()),
                commit.subject()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use deploystat_core::Config;
    use tempfile::TempDir;

    #[test]
    fn test_cmd_deploys_outside_repo_succeeds() {
        let tmp = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        let info = DeployInfo::discover(&root, &Config::default());
        let args = DeploysArgs {
            pattern: None,
            list: Some(3),
        };
        assert!(cmd_deploys(args, false, &info).is_ok());
    }

    #[test]
    fn test_cmd_deploys_rejects_bad_pattern() {
        let tmp = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        let info = DeployInfo::discover(&root, &Config::default());
        let args = DeploysArgs {
            pattern: Some("[".into()),
            list: None,
        };
        assert!(cmd_deploys(args, true, &info).is_err());
    }
}
