//! Doctor command: diagnose configuration and environment.

use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use deploystat_core::config::{self, Config};
use deploystat_core::git::{self, Git};
use deploystat_core::pattern::{ClassificationPattern, ENV_PATTERN, PatternSource};
use deploystat_core::snapshot::ENV_BUILD_LABEL;
use deploystat_core::{GitRepository, Repository};
use indicatif::{ProgressBar, ProgressStyle};
use inquire::Confirm;
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;
use tracing::{debug, instrument};

use super::heading;

const OUT: Stream = Stream::Stdout;

/// Arguments for the `doctor` subcommand.
#[derive(Args, Debug, Default)]
pub struct DoctorArgs {
    // No subcommand-specific arguments; uses global --json flag
}

#[derive(Serialize)]
struct DoctorReport {
    git: GitStatus,
    classification: PatternStatus,
    directories: DirectoryPaths,
    config: ConfigStatus,
    environment: EnvironmentInfo,
}

#[derive(Serialize)]
struct GitStatus {
    /// Whether a `git` binary is on `PATH`
    installed: bool,
    /// Whether the working directory is inside a work tree
    inside_repo: bool,
    /// Seconds allowed per `git` invocation
    timeout_secs: u64,
}

#[derive(Serialize)]
struct PatternStatus {
    pattern: String,
    source: PatternSource,
}

#[derive(Serialize)]
struct DirectoryPaths {
    config: Option<String>,
    data_local: Option<String>,
}

#[derive(Serialize)]
struct ConfigStatus {
    /// Files merged into the loaded config, lowest precedence first
    files: Vec<String>,
    /// Whether any config file was merged
    found: bool,
}

#[derive(Serialize)]
struct EnvironmentInfo {
    /// Current working directory
    cwd: Option<String>,
    /// Relevant environment variables
    env_vars: Vec<EnvVar>,
}

#[derive(Serialize)]
struct EnvVar {
    name: &'static str,
    value: Option<String>,
    description: &'static str,
}

impl EnvVar {
    fn read(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            value: std::env::var(name).ok(),
            description,
        }
    }
}

impl DoctorReport {
    fn gather(config: &Config, config_files: &[Utf8PathBuf], cwd: &Utf8Path) -> Self {
        let installed = git::is_installed();
        let repo = GitRepository::new(Git::new(cwd).with_timeout(config.git_timeout()));
        let inside_repo = installed && repo.is_available();
        let pattern = ClassificationPattern::from_env(config.pattern());

        Self {
            git: GitStatus {
                installed,
                inside_repo,
                timeout_secs: repo.git().timeout().as_secs(),
            },
            classification: PatternStatus {
                pattern: pattern.as_str().to_string(),
                source: pattern.source(),
            },
            directories: DirectoryPaths {
                config: config::user_config_dir().map(|p| p.to_string()),
                data_local: config::user_data_local_dir().map(|p| p.to_string()),
            },
            config: ConfigStatus {
                found: !config_files.is_empty(),
                files: config_files.iter().map(ToString::to_string).collect(),
            },
            environment: EnvironmentInfo {
                cwd: Some(cwd.to_string()),
                env_vars: vec![
                    EnvVar::read(ENV_PATTERN, "Deployment message pattern"),
                    EnvVar::read(ENV_BUILD_LABEL, "Build label"),
                    EnvVar::read("DEPLOYSTAT_LOG_PATH", "Explicit log file path"),
                    EnvVar::read("DEPLOYSTAT_LOG_DIR", "Log directory"),
                    EnvVar::read("XDG_CONFIG_HOME", "Override config directory"),
                    EnvVar::read("RUST_LOG", "Log filter directive"),
                ],
            },
        }
    }
}

fn check(ok: bool) -> String {
    if ok {
        "✓".if_supports_color(OUT, |s| s.green()).to_string()
    } else {
        "✗".if_supports_color(OUT, |s| s.red()).to_string()
    }
}

fn pending() -> String {
    "○".if_supports_color(OUT, |s| s.yellow()).to_string()
}

fn label(text: &str) -> String {
    text.if_supports_color(OUT, |s| s.dimmed()).to_string()
}

fn value(text: &str) -> String {
    text.if_supports_color(OUT, |s| s.cyan()).to_string()
}

/// Run diagnostics and report configuration status.
///
/// # Arguments
/// * `global_json` - Global `--json` flag from CLI
/// * `config` - Loaded configuration
/// * `config_files` - Files the loader merged into `config`
/// * `cwd` - Current working directory
#[instrument(name = "cmd_doctor", skip_all, fields(json_output))]
pub fn cmd_doctor(
    _args: DoctorArgs,
    global_json: bool,
    config: &Config,
    config_files: &[Utf8PathBuf],
    cwd: &Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing doctor command");

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("Gathering diagnostics...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));

    let report = DoctorReport::gather(config, config_files, cwd);
    spinner.finish_and_clear();

    if global_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", heading("Git"));
    if report.git.installed {
        println!("  {} git found on PATH", check(true));
    } else {
        println!("  {} git not found on PATH", check(false));
    }
    if report.git.inside_repo {
        println!("  {} Inside a git work tree", check(true));
    } else {
        println!(
            "  {} Not inside a git work tree (status will be unknown)",
            pending()
        );
    }
    println!("  {}: {}s", label("Timeout"), report.git.timeout_secs);
    println!();

    println!("{}", heading("Classification"));
    println!(
        "  {}: {}",
        label("Pattern"),
        value(&report.classification.pattern)
    );
    println!("  {}: {}", label("Source"), report.classification.source);
    println!();

    println!("{}", heading("Configuration"));
    if report.config.found {
        for file in &report.config.files {
            println!("  {} Config file: {}", check(true), value(file));
        }
    } else {
        println!("  {} No config file found", pending());
        offer_config_creation()?;
    }
    println!();

    println!("{}", heading("Directories"));
    print_dir("  Config", report.directories.config.as_deref());
    print_dir("  Data (local)", report.directories.data_local.as_deref());
    println!();

    println!("{}", heading("Environment"));
    println!("  {}: {}", label("Working directory"), value(cwd.as_str()));

    let set_vars: Vec<_> = report
        .environment
        .env_vars
        .iter()
        .filter(|v| v.value.is_some())
        .collect();

    if set_vars.is_empty() {
        println!("  {} No overrides set", label("○"));
    } else {
        for var in set_vars {
            println!(
                "  {}: {} {}",
                label(var.name),
                value(var.value.as_deref().unwrap_or("")),
                label(&format!("({})", var.description))
            );
        }
    }

    Ok(())
}

fn print_dir(name: &str, path: Option<&str>) {
    match path {
        Some(p) => println!("{}: {}", label(name), value(p)),
        None => println!(
            "{}: {}",
            label(name),
            "(unavailable)".if_supports_color(OUT, |s| s.yellow())
        ),
    }
}

/// Offer to create a default config file when none exists.
fn offer_config_creation() -> anyhow::Result<()> {
    let Some(config_dir) = config::user_config_dir() else {
        return Ok(());
    };

    let config_path = config_dir.join("config.yaml");

    // Don't prompt if running non-interactively
    if !std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        return Ok(());
    }

    let create = Confirm::new("Create a default config file?")
        .with_default(false)
        .with_help_message(&format!("Will create {config_path}"))
        .prompt();

    if let Ok(true) = create {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_saphyr::to_string(&Config::default())?;
        std::fs::write(&config_path, yaml)?;

        println!("  {} Created {}", check(true), value(config_path.as_str()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_cwd(tmp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap()
    }

    #[test]
    fn test_cmd_doctor_text_succeeds() {
        let tmp = TempDir::new().unwrap();
        let cwd = test_cwd(&tmp);
        let result = cmd_doctor(DoctorArgs::default(), false, &Config::default(), &[], &cwd);
        assert!(result.is_ok());
    }

    #[test]
    fn test_cmd_doctor_json_succeeds() {
        let tmp = TempDir::new().unwrap();
        let cwd = test_cwd(&tmp);
        let result = cmd_doctor(DoctorArgs::default(), true, &Config::default(), &[], &cwd);
        assert!(result.is_ok());
    }

    #[test]
    fn test_doctor_report_outside_repo() {
        let tmp = TempDir::new().unwrap();
        let report = DoctorReport::gather(&Config::default(), &[], &test_cwd(&tmp));
        assert!(!report.git.inside_repo);
        assert_eq!(report.git.timeout_secs, 10);
        assert!(!report.config.found);
        let names: Vec<_> = report.environment.env_vars.iter().map(|v| v.name).collect();
        assert!(names.contains(&ENV_PATTERN));
    }

    #[test]
    fn test_doctor_reports_merged_files() {
        let tmp = TempDir::new().unwrap();
        let cwd = test_cwd(&tmp);
        let files = vec![cwd.join(".deploystat.toml"), cwd.join("extra.yaml")];
        let report = DoctorReport::gather(&Config::default(), &files, &cwd);
        assert!(report.config.found);
        let expected: Vec<String> = files.iter().map(ToString::to_string).collect();
        assert_eq!(report.config.files, expected);
    }

    #[test]
    fn test_plain_helpers_without_color() {
        owo_colors::set_override(false);
        assert_eq!(check(true), "✓");
        assert_eq!(label("Timeout"), "Timeout");
        assert_eq!(value("main"), "main");
    }
}
