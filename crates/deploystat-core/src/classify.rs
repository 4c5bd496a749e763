//! Deployment classification over commit history.
//!
//! Given history newest-first and a [`ClassificationPattern`], count the
//! commits that mark a deployment and find the most recent one.
//!
//! # Status policy
//!
//! Status is decided by `HEAD` alone:
//!
//! | history | `HEAD` matches | status |
//! |---|---|---|
//! | unavailable | n/a | [`DeployStatus::Unknown`] |
//! | empty | n/a | [`DeployStatus::Unknown`] |
//! | non-empty | yes | [`DeployStatus::Success`] |
//! | non-empty | no | [`DeployStatus::Failed`] |
//!
//! Every getter that reports a status goes through [`determine_status`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::commit::CommitRecord;
use crate::pattern::ClassificationPattern;

/// Deployment count and most recent qualifying commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentSummary {
    /// Number of qualifying commits in the supplied history.
    pub count: u64,
    /// The most recent qualifying commit, if any.
    pub last_qualifying: Option<CommitRecord>,
}

/// Deployment state of the current `HEAD`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployStatus {
    /// History unavailable or empty.
    #[default]
    Unknown,
    /// `HEAD` is a deployment commit.
    Success,
    /// History exists but `HEAD` is not a deployment commit.
    Failed,
}

impl DeployStatus {
    /// Lowercase name, as serialized.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for DeployStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary plus status, with an explicit flag for whether history could be
/// read at all.
///
/// `available == false` always comes with a zero summary and
/// [`DeployStatus::Unknown`]; the flag is what tells that apart from a
/// readable history with no deployments in it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentAssessment {
    /// Whether history could be read.
    pub available: bool,
    /// Status of `HEAD`.
    pub status: DeployStatus,
    /// Count and last deployment.
    #[serde(flatten)]
    pub summary: DeploymentSummary,
}

/// Count qualifying commits and find the most recent one.
///
/// `history` must be newest-first.
pub fn classify(history: &[CommitRecord], pattern: &ClassificationPattern) -> DeploymentSummary {
    let mut qualifying = history.iter().filter(|c| pattern.is_match(&c.message));
    let last_qualifying = qualifying.next().cloned();
    let count = last_qualifying.as_ref().map_or(0, |_| 1 + qualifying.count()) as u64;

    DeploymentSummary {
        count,
        last_qualifying,
    }
}

/// Status of `HEAD` under the policy described in the module docs.
pub fn determine_status(
    history: Option<&[CommitRecord]>,
    pattern: &ClassificationPattern,
) -> DeployStatus {
    match history.and_then(<[CommitRecord]>::first) {
        None => DeployStatus::Unknown,
        Some(head) if pattern.is_match(&head.message) => DeployStatus::Success,
        Some(_) => DeployStatus::Failed,
    }
}

/// Classify `history` and attach status and availability.
///
/// `None` means history could not be read.
pub fn assess(
    history: Option<&[CommitRecord]>,
    pattern: &ClassificationPattern,
) -> DeploymentAssessment {
    DeploymentAssessment {
        available: history.is_some(),
        status: determine_status(history, pattern),
        summary: history.map(|h| classify(h, pattern)).unwrap_or_default(),
    }
}

/// Up to `limit` qualifying commits, newest first.
pub fn recent_deployments<'a>(
    history: &'a [CommitRecord],
    pattern: &ClassificationPattern,
    limit: usize,
) -> Vec<&'a CommitRecord> {
    history
        .iter()
        .filter(|c| pattern.is_match(&c.message))
        .take(limit)
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    /// Build a commit with a predictable hash and timestamp.
    pub(crate) fn commit(n: u32, message: &str) -> CommitRecord {
        CommitRecord {
            hash: format!("{n:040x}"),
            short_hash: format!("{n:07x}"),
            author_name: "Ada Lovelace".into(),
            author_email: "ada@example.com".into(),
            committer_name: "Build Bot".into(),
            message: message.into(),
            timestamp: DateTime::<Utc>::from_timestamp(1_700_000_000 - i64::from(n) * 60, 0)
                .unwrap(),
        }
    }

    fn history(messages: &[&str]) -> Vec<CommitRecord> {
        messages
            .iter()
            .enumerate()
            .map(|(i, m)| commit(i as u32, m))
            .collect()
    }

    #[test]
    fn counts_matches_and_picks_most_recent() {
        let h = history(&[
            "deploy success: v1",
            "fix bug",
            "Deployment Successful - hotfix",
        ]);
        let summary = classify(&h, &ClassificationPattern::default());

        assert_eq!(summary.count, 2);
        assert_eq!(summary.last_qualifying.as_ref(), Some(&h[0]));
    }

    #[test]
    fn no_matches_is_zero_and_absent() {
        let h = history(&["wip", "refactor"]);
        let pattern = ClassificationPattern::default();

        let summary = classify(&h, &pattern);
        assert_eq!(summary.count, 0);
        assert!(summary.last_qualifying.is_none());
        assert_eq!(determine_status(Some(&h), &pattern), DeployStatus::Failed);
    }

    #[test]
    fn unavailable_history_is_unknown() {
        let assessment = assess(None, &ClassificationPattern::default());
        assert!(!assessment.available);
        assert_eq!(assessment.status, DeployStatus::Unknown);
        assert_eq!(assessment.summary, DeploymentSummary::default());
    }

    #[test]
    fn empty_history_is_available_but_unknown() {
        let assessment = assess(Some(&[]), &ClassificationPattern::default());
        assert!(assessment.available);
        assert_eq!(assessment.status, DeployStatus::Unknown);
        assert_eq!(assessment.summary.count, 0);
    }

    #[test]
    fn custom_pattern_changes_classification() {
        let h = history(&["release v2", "deploy success v1"]);
        let pattern = ClassificationPattern::new("release").unwrap();

        let summary = classify(&h, &pattern);
        assert_eq!(summary.count, 1);
        assert_eq!(
            summary.last_qualifying.as_ref().map(|c| c.message.as_str()),
            Some("release v2")
        );

        let default = classify(&h, &ClassificationPattern::default());
        assert_eq!(default.count, 1);
        assert_eq!(
            default.last_qualifying.map(|c| c.message),
            Some("deploy success v1".to_string())
        );
    }

    #[test]
    fn head_match_is_success() {
        let h = history(&["Deploy Success", "wip"]);
        let assessment = assess(Some(&h), &ClassificationPattern::default());
        assert_eq!(assessment.status, DeployStatus::Success);
        assert_eq!(assessment.summary.count, 1);
    }

    #[test]
    fn older_match_does_not_make_head_successful() {
        let h = history(&["wip", "deploy success"]);
        let assessment = assess(Some(&h), &ClassificationPattern::default());
        assert_eq!(assessment.status, DeployStatus::Failed);
        assert_eq!(assessment.summary.count, 1);
        assert_eq!(assessment.summary.last_qualifying.as_ref(), Some(&h[1]));
    }

    #[test]
    fn count_never_exceeds_history_and_last_is_member() {
        let pattern = ClassificationPattern::new("a").unwrap();
        let samples: [&[&str]; 4] = [
            &[],
            &["a", "b", "A"],
            &["x", "y"],
            &["banana", "apple", "cherry", "date"],
        ];
        for messages in samples {
            let h = history(messages);
            let summary = classify(&h, &pattern);
            let expected = h.iter().filter(|c| c.message.to_lowercase().contains('a')).count();
            assert_eq!(summary.count as usize, expected);
            assert!(summary.count as usize <= h.len());
            match summary.last_qualifying {
                Some(ref last) => assert!(h.contains(last)),
                None => assert_eq!(summary.count, 0),
            }
        }
    }

    #[test]
    fn classify_is_deterministic() {
        let h = history(&["deploy success", "wip", "deployment successful"]);
        let pattern = ClassificationPattern::default();
        assert_eq!(classify(&h, &pattern), classify(&h, &pattern));
    }

    #[test]
    fn recent_deployments_respects_limit() {
        let h = history(&["deploy success 3", "wip", "deploy success 2", "deploy success 1"]);
        let pattern = ClassificationPattern::default();

        let recent = recent_deployments(&h, &pattern, 2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].message, "deploy success 3");
        assert_eq!(recent[1].message, "deploy success 2");
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&DeployStatus::Failed).unwrap(), "\"failed\"");
        assert_eq!(DeployStatus::Unknown.to_string(), "unknown");
    }
}
