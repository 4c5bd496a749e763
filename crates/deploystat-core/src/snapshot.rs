//! Values captured once at startup.

use camino::Utf8Path;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{Config, non_blank};
use crate::manifest;

/// Environment variable that overrides the build label.
pub const ENV_BUILD_LABEL: &str = "DEPLOYSTAT_BUILD_LABEL";

/// `chrono` format for the label derived from the load time.
const BUILD_LABEL_FORMAT: &str = "%Y%m%d.%H%M%S";

/// Load time, project version, and build label.
///
/// Fixed at construction; there are no setters, so every reader of one
/// `Snapshot` sees the same values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    loaded_at: DateTime<Utc>,
    version: String,
    build_label: String,
}

impl Snapshot {
    /// Assemble a snapshot from known values.
    pub const fn new(loaded_at: DateTime<Utc>, version: String, build_label: String) -> Self {
        Self {
            loaded_at,
            version,
            build_label,
        }
    }

    /// Capture the snapshot for the project at `root`, now.
    pub fn capture(root: &Utf8Path, config: &Config) -> Self {
        let env_label = std::env::var(ENV_BUILD_LABEL).ok();
        Self::capture_at(Utc::now(), root, config, env_label.as_deref())
    }

    /// [`capture`](Self::capture) with an explicit clock and environment.
    pub fn capture_at(
        loaded_at: DateTime<Utc>,
        root: &Utf8Path,
        config: &Config,
        env_label: Option<&str>,
    ) -> Self {
        let version = manifest::read_version(root, config.manifest());
        let build_label = non_blank(env_label)
            .or_else(|| config.build_label())
            .map_or_else(
                || loaded_at.format(BUILD_LABEL_FORMAT).to_string(),
                str::to_string,
            );

        debug!(%loaded_at, %version, %build_label, "snapshot captured");
        Self::new(loaded_at, version, build_label)
    }

    /// When the snapshot was taken.
    pub const fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Project version from the manifest.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Build label.
    pub fn build_label(&self) -> &str {
        &self.build_label
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildConfig;
    use camino::Utf8PathBuf;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    fn empty_root(tmp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap()
    }

    #[test]
    fn label_defaults_to_load_time() {
        let tmp = TempDir::new().unwrap();
        let snap = Snapshot::capture_at(fixed_time(), &empty_root(&tmp), &Config::default(), None);

        assert_eq!(snap.build_label(), "20240309.140507");
        assert_eq!(snap.version(), manifest::DEFAULT_VERSION);
        assert_eq!(snap.loaded_at(), fixed_time());
    }

    #[test]
    fn env_label_wins_over_config() {
        let tmp = TempDir::new().unwrap();
        let config = Config {
            build: Some(BuildConfig {
                label: Some("from-config".into()),
            }),
            ..Config::default()
        };

        let snap = Snapshot::capture_at(fixed_time(), &empty_root(&tmp), &config, Some("ci-77"));
        assert_eq!(snap.build_label(), "ci-77");

        let snap = Snapshot::capture_at(fixed_time(), &empty_root(&tmp), &config, Some("  "));
        assert_eq!(snap.build_label(), "from-config");
    }

    #[test]
    fn version_comes_from_manifest() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("package.json"), r#"{"version": "3.1.4"}"#).unwrap();

        let snap = Snapshot::capture_at(fixed_time(), &empty_root(&tmp), &Config::default(), None);
        assert_eq!(snap.version(), "3.1.4");
    }

    #[test]
    fn loaded_at_is_stable_across_reads() {
        let tmp = TempDir::new().unwrap();
        let snap = Snapshot::capture(&empty_root(&tmp), &Config::default());
        let first = snap.loaded_at();
        let shared = &snap;
        assert_eq!(shared.loaded_at(), first);
        assert_eq!(snap.clone().loaded_at(), first);
    }
}
