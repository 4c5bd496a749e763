//! Aggregate repository and deployment info.
//!
//! [`DeployInfo`] is the context object: build it once at startup, keep it
//! wherever it is needed, and call [`DeployInfo::query`] to take a fresh
//! [`InfoRecord`]. Each query re-reads the repository; nothing is cached
//! between calls. Read individual values off the returned record so they all
//! come from the same moment.
//!
//! # Example
//!
//! ```no_run
//! use camino::Utf8Path;
//! use deploystat_core::config::Config;
//! use deploystat_core::info::DeployInfo;
//!
//! let info = DeployInfo::discover(Utf8Path::new("."), &Config::default());
//! let record = info.query();
//! println!("{} deploys, status {}", record.deploy_count(), record.deploy_status());
//! ```

use camino::Utf8Path;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::classify::{self, DeployStatus, DeploymentAssessment};
use crate::commit::CommitRecord;
use crate::config::Config;
use crate::git::Git;
use crate::pattern::ClassificationPattern;
use crate::repo::{GitRepository, Repository, UNKNOWN};
use crate::snapshot::Snapshot;

/// Repository state at query time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    /// Current branch; absent when detached or unavailable.
    pub branch: Option<String>,
    /// The commit at `HEAD`.
    pub head: Option<CommitRecord>,
    /// Commits reachable from `HEAD`.
    pub total_commits: u64,
    /// Most recent reachable tag; absent when there is none.
    pub latest_tag: Option<String>,
}

/// Everything known about the build, repository, and deployments at one
/// point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoRecord {
    /// Startup snapshot.
    pub snapshot: Snapshot,
    /// Repository state.
    pub repository: RepositoryInfo,
    /// Deployment classification.
    pub deployments: DeploymentAssessment,
}

impl InfoRecord {
    /// Project version.
    pub fn version(&self) -> &str {
        self.snapshot.version()
    }

    /// When the snapshot was taken.
    pub const fn loaded_at(&self) -> DateTime<Utc> {
        self.snapshot.loaded_at()
    }

    /// Build label.
    pub fn build_label(&self) -> &str {
        self.snapshot.build_label()
    }

    /// Short hash of `HEAD`, or `"unknown"`.
    pub fn commit_hash(&self) -> &str {
        self.head().map_or(UNKNOWN, |c| c.short_hash.as_str())
    }

    /// Current branch, or `"unknown"`.
    pub fn branch(&self) -> &str {
        self.repository.branch.as_deref().unwrap_or(UNKNOWN)
    }

    /// Author of `HEAD`, or `"unknown"`.
    pub fn author(&self) -> &str {
        self.head().map_or(UNKNOWN, |c| c.author_name.as_str())
    }

    /// Author email of `HEAD`, or `"unknown"`.
    pub fn author_email(&self) -> &str {
        self.head().map_or(UNKNOWN, |c| c.author_email.as_str())
    }

    /// Committer of `HEAD`, or `"unknown"`.
    pub fn committer(&self) -> &str {
        self.head().map_or(UNKNOWN, |c| c.committer_name.as_str())
    }

    /// Message of `HEAD`, or `"unknown"`.
    pub fn last_commit_message(&self) -> &str {
        self.head().map_or(UNKNOWN, |c| c.message.as_str())
    }

    /// Commit time of `HEAD`.
    pub fn last_commit_time(&self) -> Option<DateTime<Utc>> {
        self.head().map(|c| c.timestamp)
    }

    /// The commit at `HEAD`.
    pub const fn head(&self) -> Option<&CommitRecord> {
        self.repository.head.as_ref()
    }

    /// Most recent reachable tag.
    pub fn latest_tag(&self) -> Option<&str> {
        self.repository.latest_tag.as_deref()
    }

    /// Commits reachable from `HEAD`.
    pub const fn total_commits(&self) -> u64 {
        self.repository.total_commits
    }

    /// Number of deployment commits.
    pub const fn deploy_count(&self) -> u64 {
        self.deployments.summary.count
    }

    /// Most recent deployment commit.
    pub const fn last_deploy(&self) -> Option<&CommitRecord> {
        self.deployments.summary.last_qualifying.as_ref()
    }

    /// Deployment status of `HEAD`.
    pub const fn deploy_status(&self) -> DeployStatus {
        self.deployments.status
    }

    /// Whether history could be read.
    pub const fn history_available(&self) -> bool {
        self.deployments.available
    }
}

/// Explicit context: snapshot, repository, and the active pattern.
#[derive(Debug, Clone)]
pub struct DeployInfo<R> {
    snapshot: Snapshot,
    repo: R,
    pattern: ClassificationPattern,
}

impl DeployInfo<GitRepository> {
    /// Build a git-backed context for the project at `root`.
    ///
    /// Captures the snapshot now and resolves the pattern from the
    /// environment and `config`.
    pub fn discover(root: &Utf8Path, config: &Config) -> Self {
        let git = Git::new(root).with_timeout(config.git_timeout());
        Self::new(
            Snapshot::capture(root, config),
            GitRepository::new(git),
            ClassificationPattern::from_env(config.pattern()),
        )
    }
}

impl<R: Repository> DeployInfo<R> {
    /// Assemble a context from its parts.
    pub const fn new(snapshot: Snapshot, repo: R, pattern: ClassificationPattern) -> Self {
        Self {
            snapshot,
            repo,
            pattern,
        }
    }

    /// Replace the active pattern.
    #[must_use]
    pub fn with_pattern(mut self, pattern: ClassificationPattern) -> Self {
        self.pattern = pattern;
        self
    }

    /// The startup snapshot.
    pub const fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// The active pattern.
    pub const fn pattern(&self) -> &ClassificationPattern {
        &self.pattern
    }

    /// The repository being queried.
    pub const fn repository(&self) -> &R {
        &self.repo
    }

    /// Query the repository and assemble a fresh record.
    #[instrument(skip(self), fields(pattern = %self.pattern))]
    pub fn query(&self) -> InfoRecord {
        let history = self.repo.history();
        let deployments = classify::assess(history.as_deref(), &self.pattern);
        let head = history
            .as_ref()
            .and_then(|h| h.first().cloned())
            .or_else(|| history.is_none().then(|| self.repo.head()).flatten());

        let repository = RepositoryInfo {
            branch: self.repo.branch(),
            head,
            total_commits: self.repo.commit_count(),
            latest_tag: self.repo.latest_tag(),
        };

        debug!(
            status = %deployments.status,
            count = deployments.summary.count,
            available = deployments.available,
            "info assembled"
        );

        InfoRecord {
            snapshot: self.snapshot.clone(),
            repository,
            deployments,
        }
    }

    /// Classification only, without the other repository queries.
    pub fn deployments(&self) -> DeploymentAssessment {
        classify::assess(self.repo.history().as_deref(), &self.pattern)
    }

    /// Up to `limit` most recent deployment commits.
    ///
    /// `None` when history is unavailable.
    pub fn recent_deployments(&self, limit: usize) -> Option<Vec<CommitRecord>> {
        let history = self.repo.history()?;
        Some(
            classify::recent_deployments(&history, &self.pattern, limit)
                .into_iter()
                .cloned()
                .collect(),
        )
    }
}
