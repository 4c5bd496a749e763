//! Commit records read from `git log`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::git::{GitError, GitResult};

/// Separates fields within one record (ASCII unit separator).
const FIELD_SEP: char = '\x1f';
/// Separates records; `git log -z` writes a NUL between commits.
const RECORD_SEP: char = '\0';
/// Number of fields in [`LOG_FORMAT`].
const FIELD_COUNT: usize = 7;

/// `git log -z --format` string producing one parseable record per commit.
///
/// The message comes last so separator bytes inside it stay in the message.
pub const LOG_FORMAT: &str = "%H%x1f%h%x1f%an%x1f%ae%x1f%cn%x1f%ct%x1f%B";

/// A single commit as read from history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Full object hash.
    pub hash: String,
    /// Abbreviated hash as git would print it.
    pub short_hash: String,
    /// Author name.
    pub author_name: String,
    /// Author email.
    pub author_email: String,
    /// Committer name.
    pub committer_name: String,
    /// Full commit message (trailing whitespace removed).
    pub message: String,
    /// Commit time.
    pub timestamp: DateTime<Utc>,
}

impl CommitRecord {
    /// First line of the message.
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }
}

/// Parse the output of `git log -z --format=LOG_FORMAT`.
///
/// A malformed record is logged and skipped; the rest of the history is kept.
pub(crate) fn parse_log(output: &str) -> Vec<CommitRecord> {
    output
        .split(RECORD_SEP)
        .map(|record| record.trim_start_matches(['\n', '\r']))
        .filter(|record| !record.trim().is_empty())
        .filter_map(|record| match parse_record(record) {
            Ok(commit) => Some(commit),
            Err(e) => {
                warn!(error = %e, "skipping malformed log record");
                None
            }
        })
        .collect()
}

pub(crate) fn parse_record(record: &str) -> GitResult<CommitRecord> {
    let fields: Vec<&str> = record.splitn(FIELD_COUNT, FIELD_SEP).collect();
    let &[hash, short_hash, author_name, author_email, committer_name, epoch, message] =
        fields.as_slice()
    else {
        return Err(parse_error(format!(
            "expected {FIELD_COUNT} fields, found {}",
            fields.len()
        )));
    };

    let timestamp = parse_epoch(epoch)
        .ok_or_else(|| parse_error(format!("not an epoch timestamp: {epoch:?}")))?;

    Ok(CommitRecord {
        hash: hash.to_string(),
        short_hash: short_hash.to_string(),
        author_name: author_name.to_string(),
        author_email: author_email.to_string(),
        committer_name: committer_name.to_string(),
        message: message.trim_end().to_string(),
        timestamp,
    })
}

/// Parse seconds since the Unix epoch, as printed by `%ct`.
pub(crate) fn parse_epoch(raw: &str) -> Option<DateTime<Utc>> {
    let secs: i64 = raw.trim().parse().ok()?;
    DateTime::from_timestamp(secs, 0)
}

fn parse_error(message: String) -> GitError {
    GitError::Parse {
        command: "log".into(),
        message,
    }
}
