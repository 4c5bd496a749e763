//! Repository queries that never fail.
//!
//! [`Repository`] is what the assembler reads from. Failures are absorbed
//! here: the git-backed implementation logs a warning and hands back a
//! sentinel (`None`, or `0` for counts) instead of an error.

use tracing::warn;

use crate::commit::CommitRecord;
use crate::git::{Git, GitError, GitResult};

/// Text shown in place of a value that could not be read.
pub const UNKNOWN: &str = "unknown";

/// Read-only view of version-control history.
pub trait Repository {
    /// Whether history can be read at all.
    fn is_available(&self) -> bool;

    /// The commit at `HEAD`.
    fn head(&self) -> Option<CommitRecord>;

    /// Current branch; `None` when detached or unavailable.
    fn branch(&self) -> Option<String>;

    /// Full history from `HEAD`, newest first. `None` when unavailable.
    fn history(&self) -> Option<Vec<CommitRecord>>;

    /// Number of commits reachable from `HEAD`; `0` when unavailable.
    fn commit_count(&self) -> u64;

    /// Most recent tag reachable from `HEAD`.
    fn latest_tag(&self) -> Option<String>;
}

/// [`Repository`] backed by the `git` CLI.
#[derive(Debug, Clone)]
pub struct GitRepository {
    git: Git,
}

impl GitRepository {
    /// Wrap a [`Git`] handle.
    pub const fn new(git: Git) -> Self {
        Self { git }
    }

    /// The underlying handle.
    pub const fn git(&self) -> &Git {
        &self.git
    }
}

/// Log and discard an error. `NotARepo` is expected outside a checkout and
/// logs at debug.
fn absorb<T>(query: &'static str, result: GitResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(GitError::NotARepo) => {
            tracing::debug!(query, "not a git repository");
            None
        }
        Err(e) => {
            warn!(query, error = %e, "git query failed, using sentinel");
            None
        }
    }
}

impl Repository for GitRepository {
    fn is_available(&self) -> bool {
        absorb("is_inside_repo", self.git.is_inside_repo()).unwrap_or(false)
    }

    fn head(&self) -> Option<CommitRecord> {
        if !absorb("has_commits", self.git.has_commits())? {
            return None;
        }
        absorb("head", self.git.commit("HEAD"))
    }

    fn branch(&self) -> Option<String> {
        absorb("branch", self.git.branch()).flatten()
    }

    fn history(&self) -> Option<Vec<CommitRecord>> {
        absorb("history", self.git.history(None))
    }

    fn commit_count(&self) -> u64 {
        if absorb("has_commits", self.git.has_commits()) != Some(true) {
            return 0;
        }
        absorb("commit_count", self.git.commit_count()).unwrap_or(0)
    }

    fn latest_tag(&self) -> Option<String> {
        absorb("latest_tag", self.git.latest_tag()).flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::tests::Fixture;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    #[test]
    fn outside_repo_everything_is_sentinel() {
        let tmp = TempDir::new().unwrap();
        let git = Git::new(Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap());
        let repo = GitRepository::new(git);

        assert!(!repo.is_available());
        assert!(repo.head().is_none());
        assert!(repo.branch().is_none());
        assert!(repo.history().is_none());
        assert_eq!(repo.commit_count(), 0);
        assert!(repo.latest_tag().is_none());
    }

    #[test]
    fn empty_repo_is_available_with_no_commits() {
        let Some(fx) = Fixture::init() else { return };
        let repo = GitRepository::new(fx.git.clone());

        assert!(repo.is_available());
        assert!(repo.head().is_none());
        assert_eq!(repo.branch().as_deref(), Some("main"));
        assert_eq!(repo.history(), Some(Vec::new()));
        assert_eq!(repo.commit_count(), 0);
    }

    #[test]
    fn populated_repo_reports_values() {
        let Some(fx) = Fixture::init() else { return };
        fx.commit("initial");
        fx.tag("v1.0.0");
        fx.commit("deploy success: v1.0.1");
        let repo = GitRepository::new(fx.git.clone());

        let head = repo.head().unwrap();
        assert_eq!(head.message, "deploy success: v1.0.1");
        assert_eq!(repo.branch().as_deref(), Some("main"));
        assert_eq!(repo.history().map(|h| h.len()), Some(2));
        assert_eq!(repo.commit_count(), 2);
        assert_eq!(repo.latest_tag().as_deref(), Some("v1.0.0"));
    }
}
