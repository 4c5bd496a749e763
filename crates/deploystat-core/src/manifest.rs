//! Project version from the local manifest.
//!
//! Looks for `package.json`, then `Cargo.toml`, in the project root (or reads
//! an explicitly configured manifest). The version must be valid semver.
//! [`read_version`] never fails: anything unreadable is logged and replaced
//! with [`DEFAULT_VERSION`].

use camino::{Utf8Path, Utf8PathBuf};
use figment::Figment;
use figment::providers::{Format, Json, Toml};
use semver::Version;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::ecosystem::Ecosystem;

/// Version reported when no manifest yields a usable one.
pub const DEFAULT_VERSION: &str = "1.0.0";

/// Errors from reading a manifest version.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// No recognized manifest in the project root.
    #[error("no package.json or Cargo.toml in {0}")]
    NotFound(Utf8PathBuf),

    /// The file name is not a manifest we know how to read.
    #[error("unsupported manifest: {0}")]
    Unsupported(Utf8PathBuf),

    /// The manifest could not be read or has no string version.
    #[error("failed to read version from {path}: {source}")]
    Read {
        /// The manifest path.
        path: Utf8PathBuf,
        /// Underlying figment error.
        #[source]
        source: Box<figment::Error>,
    },

    /// The version string is not semver.
    #[error("invalid version {version:?} in {path}: {source}")]
    Invalid {
        /// The manifest path.
        path: Utf8PathBuf,
        /// The rejected value.
        version: String,
        /// Why it was rejected.
        #[source]
        source: semver::Error,
    },
}

/// Result alias for manifest operations.
pub type ManifestResult<T> = Result<T, ManifestError>;

/// Find the first recognized manifest in `root`.
pub fn find_manifest(root: &Utf8Path) -> Option<Utf8PathBuf> {
    Ecosystem::ALL
        .iter()
        .map(|eco| root.join(eco.marker_file()))
        .find(|path| path.is_file())
}

/// Read and validate the version from a specific manifest.
#[instrument(fields(path = %path))]
pub fn manifest_version(path: &Utf8Path) -> ManifestResult<Version> {
    let ecosystem =
        Ecosystem::from_manifest(path).ok_or_else(|| ManifestError::Unsupported(path.into()))?;

    let figment = match ecosystem {
        Ecosystem::Node => Figment::from(Json::file_exact(path.as_str())),
        Ecosystem::Rust => Figment::from(Toml::file_exact(path.as_str())),
    };

    let raw: String = figment
        .extract_inner(ecosystem.version_key())
        .map_err(|e| ManifestError::Read {
            path: path.into(),
            source: Box::new(e),
        })?;

    let version = Version::parse(raw.trim()).map_err(|source| ManifestError::Invalid {
        path: path.into(),
        version: raw.clone(),
        source,
    })?;
    debug!(%ecosystem, %version, "manifest version");
    Ok(version)
}

/// Project version as a string, falling back to [`DEFAULT_VERSION`].
///
/// `explicit` (relative to `root`) replaces manifest discovery.
pub fn read_version(root: &Utf8Path, explicit: Option<&Utf8Path>) -> String {
    let path = match explicit {
        Some(p) => Some(root.join(p)),
        None => find_manifest(root),
    };

    let result = path
        .ok_or_else(|| ManifestError::NotFound(root.into()))
        .and_then(|p| manifest_version(&p));

    match result {
        Ok(version) => version.to_string(),
        Err(ManifestError::NotFound(dir)) => {
            debug!(%dir, "no manifest, using default version");
            DEFAULT_VERSION.to_string()
        }
        Err(e) => {
            warn!(%e, "using default version");
            DEFAULT_VERSION.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn root(tmp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap()
    }

    #[test]
    fn reads_package_json() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("package.json"),
            r#"{"name": "web", "version": "2.4.1"}"#,
        )
        .unwrap();

        assert_eq!(read_version(&root(&tmp), None), "2.4.1");
    }

    #[test]
    fn reads_cargo_toml() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("Cargo.toml"),
            "[package]\nname = \"svc\"\nversion = \"0.3.0-beta.1\"\n",
        )
        .unwrap();

        assert_eq!(read_version(&root(&tmp), None), "0.3.0-beta.1");
    }

    #[test]
    fn package_json_wins_over_cargo_toml() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("package.json"), r#"{"version": "5.0.0"}"#).unwrap();
        fs::write(
            tmp.path().join("Cargo.toml"),
            "[package]\nversion = \"0.1.0\"\n",
        )
        .unwrap();

        assert_eq!(read_version(&root(&tmp), None), "5.0.0");
    }

    #[test]
    fn missing_manifest_defaults() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(read_version(&root(&tmp), None), DEFAULT_VERSION);
    }

    #[test]
    fn malformed_json_defaults() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("package.json"), "{ not json").unwrap();
        assert_eq!(read_version(&root(&tmp), None), DEFAULT_VERSION);
    }

    #[test]
    fn non_semver_version_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("package.json");
        fs::write(&path, r#"{"version": "latest"}"#).unwrap();

        assert_eq!(read_version(&root(&tmp), None), DEFAULT_VERSION);
        let path = Utf8PathBuf::try_from(path).unwrap();
        assert!(matches!(
            manifest_version(&path),
            Err(ManifestError::Invalid { .. })
        ));
    }

    #[test]
    fn workspace_inherited_version_defaults() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("Cargo.toml"),
            "[package]\nversion.workspace = true\n",
        )
        .unwrap();
        assert_eq!(read_version(&root(&tmp), None), DEFAULT_VERSION);
    }

    #[test]
    fn explicit_manifest_is_relative_to_root() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("web")).unwrap();
        fs::write(tmp.path().join("web/package.json"), r#"{"version": "9.9.9"}"#).unwrap();

        let version = read_version(&root(&tmp), Some(Utf8Path::new("web/package.json")));
        assert_eq!(version, "9.9.9");
    }

    #[test]
    fn unsupported_manifest_is_rejected() {
        assert!(matches!(
            manifest_version(Utf8Path::new("setup.py")),
            Err(ManifestError::Unsupported(_))
        ));
    }
}
