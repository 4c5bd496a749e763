//! Commit-message patterns that mark a deployment.
//!
//! A commit "qualifies" when its message contains a match for the active
//! pattern, compared case-insensitively. Patterns are regular expressions,
//! so alternation (`a|b`) works; they are compiled and validated up front and
//! never passed through to `git`.

use std::fmt;

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::non_blank;

/// Pattern used when no override is configured.
pub const DEFAULT_PATTERN: &str = "deploy success|deployment successful";

/// Environment variable that overrides the configured pattern.
pub const ENV_PATTERN: &str = "DEPLOYSTAT_PATTERN";

/// Upper bound on the compiled program size, so a pathological override
/// fails to compile instead of eating memory.
const SIZE_LIMIT: usize = 1 << 20;

/// Errors from building a classification pattern.
#[derive(Error, Debug)]
pub enum PatternError {
    /// The pattern is empty or only whitespace.
    #[error("pattern is empty")]
    Empty,

    /// The pattern is not a valid regular expression.
    #[error("invalid pattern {pattern:?}: {source}")]
    Invalid {
        /// The rejected pattern.
        pattern: String,
        /// Why the regex engine rejected it.
        #[source]
        source: regex::Error,
    },
}

/// Result alias for pattern operations.
pub type PatternResult<T> = Result<T, PatternError>;

/// Where the active pattern came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternSource {
    /// Explicit value supplied by the caller (e.g., a CLI flag).
    Explicit,
    /// The [`ENV_PATTERN`] environment variable.
    Environment,
    /// The `deploy.pattern` config key.
    Config,
    /// [`DEFAULT_PATTERN`].
    Default,
}

impl fmt::Display for PatternSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit => write!(f, "explicit"),
            Self::Environment => write!(f, "environment ({ENV_PATTERN})"),
            Self::Config => write!(f, "config (deploy.pattern)"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// A compiled, case-insensitive deployment pattern.
#[derive(Debug, Clone)]
pub struct ClassificationPattern {
    raw: String,
    regex: Regex,
    source: PatternSource,
}

impl ClassificationPattern {
    /// Compile `raw` as a case-insensitive regular expression.
    pub fn new(raw: &str) -> PatternResult<Self> {
        Self::compile(raw, PatternSource::Explicit)
    }

    fn compile(raw: &str, source: PatternSource) -> PatternResult<Self> {
        if raw.trim().is_empty() {
            return Err(PatternError::Empty);
        }
        let regex = RegexBuilder::new(raw)
            .case_insensitive(true)
            .size_limit(SIZE_LIMIT)
            .build()
            .map_err(|source| PatternError::Invalid {
                pattern: raw.to_string(),
                source,
            })?;
        Ok(Self {
            raw: raw.to_string(),
            regex,
            source,
        })
    }

    /// Pick the active pattern from an environment value and a config value.
    ///
    /// The environment wins over config, config over [`DEFAULT_PATTERN`].
    /// Blank values are skipped; invalid ones are logged and skipped.
    pub fn resolve(env_value: Option<&str>, config_value: Option<&str>) -> Self {
        let candidates = [
            (non_blank(env_value), PatternSource::Environment),
            (non_blank(config_value), PatternSource::Config),
        ];

        for (value, source) in candidates {
            let Some(raw) = value else { continue };
            match Self::compile(raw, source) {
                Ok(pattern) => {
                    debug!(pattern = raw, %source, "using pattern override");
                    return pattern;
                }
                Err(e) => warn!(%e, %source, "ignoring pattern override"),
            }
        }

        Self::default()
    }

    /// [`resolve`](Self::resolve) using the process environment.
    pub fn from_env(config_value: Option<&str>) -> Self {
        let env_value = std::env::var(ENV_PATTERN).ok();
        Self::resolve(env_value.as_deref(), config_value)
    }

    /// Whether `message` contains a match, ignoring case.
    pub fn is_match(&self, message: &str) -> bool {
        self.regex.is_match(message)
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Where this pattern came from.
    pub const fn source(&self) -> PatternSource {
        self.source
    }
}

impl Default for ClassificationPattern {
    fn default() -> Self {
        Self::compile(DEFAULT_PATTERN, PatternSource::Default)
            .expect("default pattern is a valid regex")
    }
}

impl PartialEq for ClassificationPattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for ClassificationPattern {}

impl fmt::Display for ClassificationPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_either_phrase_in_any_case() {
        let p = ClassificationPattern::default();
        assert!(p.is_match("deploy success: v1"));
        assert!(p.is_match("Deployment Successful - hotfix"));
        assert!(p.is_match("chore: DEPLOY SUCCESS"));
        assert!(!p.is_match("deploy failed"));
        assert!(!p.is_match("fix bug"));
        assert_eq!(p.source(), PatternSource::Default);
    }

    #[test]
    fn match_is_substring_not_whole_message() {
        let p = ClassificationPattern::new("release").unwrap();
        assert!(p.is_match("release v2"));
        assert!(p.is_match("pre-release cleanup"));
        assert!(!p.is_match("deploy success v1"));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let err = ClassificationPattern::new("deploy (").unwrap_err();
        assert!(matches!(err, PatternError::Invalid { .. }));
    }

    #[test]
    fn blank_pattern_is_rejected() {
        assert!(matches!(
            ClassificationPattern::new("   "),
            Err(PatternError::Empty)
        ));
    }

    #[test]
    fn resolve_prefers_environment_over_config() {
        let p = ClassificationPattern::resolve(Some("shipped"), Some("release"));
        assert_eq!(p.as_str(), "shipped");
        assert_eq!(p.source(), PatternSource::Environment);
    }

    #[test]
    fn resolve_falls_back_to_config() {
        let p = ClassificationPattern::resolve(None, Some("release"));
        assert_eq!(p.as_str(), "release");
        assert_eq!(p.source(), PatternSource::Config);
    }

    #[test]
    fn resolve_ignores_whitespace_only_values() {
        let p = ClassificationPattern::resolve(Some("  \t"), Some(""));
        assert_eq!(p, ClassificationPattern::default());
        assert_eq!(p.source(), PatternSource::Default);
    }

    #[test]
    fn resolve_skips_invalid_override() {
        let p = ClassificationPattern::resolve(Some("[unclosed"), Some("release"));
        assert_eq!(p.as_str(), "release");

        let p = ClassificationPattern::resolve(Some("[unclosed"), None);
        assert_eq!(p.as_str(), DEFAULT_PATTERN);
    }
}
