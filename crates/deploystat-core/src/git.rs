//! Git operations for repository metadata.
//!
//! Shells out to `git` for all operations so we read exactly what the user's
//! own `git` would report (worktrees, `safe.directory`, mailmap, etc.).
//!
//! Every invocation is bounded by a timeout. A hung `git` (credential
//! helper waiting on a tty, a stale lock on a network mount) is killed and
//! reported as [`GitError::Timeout`].

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::commit::{self, CommitRecord, LOG_FORMAT};
use crate::pattern::ClassificationPattern;

/// Default upper bound for a single `git` invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// How often a running child is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Errors from git operations.
#[derive(Error, Debug)]
pub enum GitError {
    /// Failed to execute the `git` command.
    #[error("failed to run git: {0}")]
    Exec(#[from] std::io::Error),

    /// `git` returned a non-zero exit code.
    #[error("git {command} failed: {stderr}")]
    Command {
        /// The git subcommand that failed (e.g., "log").
        command: String,
        /// Captured stderr.
        stderr: String,
    },

    /// Not inside a git repository.
    #[error("not a git repository (or any parent up to mount point)")]
    NotARepo,

    /// `git` did not finish within the configured timeout.
    #[error("git {command} timed out after {after:?}")]
    Timeout {
        /// The git subcommand that was killed.
        command: String,
        /// The timeout that expired.
        after: Duration,
    },

    /// `git` succeeded but its output could not be interpreted.
    #[error("unexpected output from git {command}: {message}")]
    Parse {
        /// The git subcommand whose output was rejected.
        command: String,
        /// What was wrong with it.
        message: String,
    },

    /// A revision argument that git would read as an option.
    #[error("invalid revision: {0:?}")]
    InvalidRevision(String),
}

/// Result alias for git operations.
pub type GitResult<T> = Result<T, GitError>;

/// Whether a `git` binary is on `PATH`.
pub fn is_installed() -> bool {
    which::which("git").is_ok()
}

/// Handle for running read-only `git` queries against one working directory.
#[derive(Debug, Clone)]
pub struct Git {
    workdir: Utf8PathBuf,
    timeout: Duration,
}

impl Git {
    /// Create a handle rooted at `workdir` with the [`DEFAULT_TIMEOUT`].
    pub fn new<P: AsRef<Utf8Path>>(workdir: P) -> Self {
        Self {
            workdir: workdir.as_ref().to_path_buf(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the per-invocation timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Directory every `git` invocation runs in.
    pub fn workdir(&self) -> &Utf8Path {
        &self.workdir
    }

    /// The per-invocation timeout.
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Check if the working directory is inside a git repository.
    #[instrument(skip(self), fields(workdir = %self.workdir))]
    pub fn is_inside_repo(&self) -> GitResult<bool> {
        match self.run(&["rev-parse", "--is-inside-work-tree"]) {
            Ok(output) => Ok(output.trim() == "true"),
            Err(GitError::Command { .. } | GitError::NotARepo) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Whether `HEAD` resolves to a commit (false in a freshly initialized repo).
    #[instrument(skip(self))]
    pub fn has_commits(&self) -> GitResult<bool> {
        match self.run(&["rev-parse", "--verify", "--quiet", "HEAD"]) {
            Ok(_) => Ok(true),
            Err(GitError::Command { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Abbreviated hash of `rev`.
    #[instrument(skip(self))]
    pub fn short_hash(&self, rev: &str) -> GitResult<String> {
        let rev = checked_rev(rev)?;
        let hash = self.run(&["rev-parse", "--short", rev])?.trim().to_string();
        debug!(%hash, "short hash");
        Ok(hash)
    }

    /// Get the current branch name.
    ///
    /// Returns `None` if in a detached HEAD state. A branch with no commits
    /// yet is still reported by name.
    #[instrument(skip(self))]
    pub fn branch(&self) -> GitResult<Option<String>> {
        let output = match self.run(&["rev-parse", "--abbrev-ref", "HEAD"]) {
            Ok(output) => output,
            Err(GitError::Command { .. }) => return self.unborn_branch(),
            Err(e) => return Err(e),
        };
        let branch = output.trim().to_string();
        if branch == "HEAD" {
            debug!("detached HEAD");
            Ok(None)
        } else {
            debug!(%branch, "current branch");
            Ok(Some(branch))
        }
    }

    /// Branch `HEAD` points at before its first commit.
    fn unborn_branch(&self) -> GitResult<Option<String>> {
        match self.run(&["symbolic-ref", "--short", "-q", "HEAD"]) {
            Ok(output) => {
                let branch = output.trim().to_string();
                debug!(%branch, "unborn branch");
                Ok(Some(branch).filter(|b| !b.is_empty()))
            }
            Err(GitError::Command { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Author name of `rev`.
    pub fn author_name(&self, rev: &str) -> GitResult<String> {
        self.log_field(rev, "%an")
    }

    /// Author email of `rev`.
    pub fn author_email(&self, rev: &str) -> GitResult<String> {
        self.log_field(rev, "%ae")
    }

    /// Committer name of `rev`.
    pub fn committer_name(&self, rev: &str) -> GitResult<String> {
        self.log_field(rev, "%cn")
    }

    /// Full commit message of `rev`, trailing whitespace removed.
    pub fn message(&self, rev: &str) -> GitResult<String> {
        self.log_field(rev, "%B")
    }

    /// Commit time of `rev`.
    #[instrument(skip(self))]
    pub fn timestamp(&self, rev: &str) -> GitResult<DateTime<Utc>> {
        let raw = self.log_field(rev, "%ct")?;
        commit::parse_epoch(&raw).ok_or_else(|| GitError::Parse {
            command: "log".into(),
            message: format!("not an epoch timestamp: {raw:?}"),
        })
    }

    /// Read the full record for a single commit.
    #[instrument(skip(self))]
    pub fn commit(&self, rev: &str) -> GitResult<CommitRecord> {
        let rev = checked_rev(rev)?;
        let format = format!("--format={LOG_FORMAT}");
        let output = self.run(&["log", "-1", "-z", &format, rev])?;
        commit::parse_log(&output)
            .into_iter()
            .next()
            .ok_or_else(|| GitError::Parse {
                command: "log".into(),
                message: format!("no commit record for {rev}"),
            })
    }

    /// Number of commits reachable from `HEAD`.
    #[instrument(skip(self))]
    pub fn commit_count(&self) -> GitResult<u64> {
        let output = self.run(&["rev-list", "--count", "HEAD"])?;
        let count = output.trim().parse().map_err(|e| GitError::Parse {
            command: "rev-list".into(),
            message: format!("{e}: {:?}", output.trim()),
        })?;
        debug!(count, "commit count");
        Ok(count)
    }

    /// Commits reachable from `HEAD`, newest first.
    ///
    /// `limit` caps the number of commits read; `None` reads the whole
    /// history. A repository without any commits yields an empty list.
    #[instrument(skip(self))]
    pub fn history(&self, limit: Option<usize>) -> GitResult<Vec<CommitRecord>> {
        if !self.has_commits()? {
            debug!("repository has no commits");
            return Ok(Vec::new());
        }

        let format = format!("--format={LOG_FORMAT}");
        let max_count = limit.map(|n| format!("--max-count={n}"));
        let mut args = vec!["log", "-z", format.as_str()];
        if let Some(ref max) = max_count {
            args.push(max);
        }
        args.push("HEAD");

        let commits = commit::parse_log(&self.run(&args)?);
        debug!(count = commits.len(), "read history");
        Ok(commits)
    }

    /// Commits whose message matches `pattern`, newest first.
    ///
    /// The pattern is evaluated in-process; it is never handed to
    /// `git log --grep`.
    #[instrument(skip(self, pattern), fields(pattern = %pattern))]
    pub fn commits_matching(
        &self,
        pattern: &ClassificationPattern,
        limit: Option<usize>,
    ) -> GitResult<Vec<CommitRecord>> {
        let matching: Vec<CommitRecord> = self
            .history(None)?
            .into_iter()
            .filter(|c| pattern.is_match(&c.message))
            .take(limit.unwrap_or(usize::MAX))
            .collect();
        debug!(count = matching.len(), "matching commits");
        Ok(matching)
    }

    /// Most recent tag reachable from `HEAD`, if any.
    #[instrument(skip(self))]
    pub fn latest_tag(&self) -> GitResult<Option<String>> {
        match self.run(&["describe", "--tags", "--abbrev=0"]) {
            Ok(output) => {
                let tag = output.trim().to_string();
                debug!(%tag, "latest tag");
                Ok((!tag.is_empty()).then_some(tag))
            }
            // "No names found" and "no commits yet" both land here
            Err(GitError::Command { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn log_field(&self, rev: &str, placeholder: &str) -> GitResult<String> {
        let rev = checked_rev(rev)?;
        let format = format!("--format={placeholder}");
        let output = self.run(&["log", "-1", &format, rev])?;
        Ok(output.trim_end().to_string())
    }

    /// Run a git command and return its stdout.
    fn run(&self, args: &[&str]) -> GitResult<String> {
        let command = args.first().copied().unwrap_or_default().to_string();
        let start = Instant::now();

        let mut child = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .env("LC_ALL", "C")
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if start.elapsed() >= self.timeout {
                let _ = child.kill();
                let _ = child.wait();
                debug!(%command, timeout = ?self.timeout, "git killed after timeout");
                return Err(GitError::Timeout {
                    command,
                    after: self.timeout,
                });
            }
            thread::sleep(POLL_INTERVAL);
        };

        let stdout = join(stdout);
        let stderr = join(stderr);

        if status.success() {
            Ok(String::from_utf8_lossy(&stdout).to_string())
        } else {
            let stderr = String::from_utf8_lossy(&stderr).trim().to_string();

            // Detect "not a git repo" specifically
            if stderr.contains("not a git repository") {
                return Err(GitError::NotARepo);
            }

            Err(GitError::Command { command, stderr })
        }
    }
}

/// Reject revisions git would parse as options.
fn checked_rev(rev: &str) -> GitResult<&str> {
    if rev.is_empty() || rev.starts_with('-') {
        return Err(GitError::InvalidRevision(rev.to_string()));
    }
    Ok(rev)
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    })
}

fn join(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}
