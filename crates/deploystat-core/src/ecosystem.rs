//! Project ecosystems and the manifests that carry their version.
//!
//! Pure types and data; reading the manifest lives in
//! [`manifest`](crate::manifest).

use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A recognized project ecosystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    /// Node.js project (detected via `package.json`).
    Node,
    /// Rust project (detected via `Cargo.toml`).
    Rust,
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node => write!(f, "node"),
            Self::Rust => write!(f, "rust"),
        }
    }
}

impl Ecosystem {
    /// Manifest filename that signals this ecosystem.
    pub const fn marker_file(self) -> &'static str {
        match self {
            Self::Node => "package.json",
            Self::Rust => "Cargo.toml",
        }
    }

    /// Dotted key path of the version inside the manifest.
    pub const fn version_key(self) -> &'static str {
        match self {
            Self::Node => "version",
            Self::Rust => "package.version",
        }
    }

    /// Identify the ecosystem from a manifest's file name.
    pub fn from_manifest(path: &Utf8Path) -> Option<Self> {
        let name = path.file_name()?;
        Self::ALL
            .iter()
            .copied()
            .find(|eco| eco.marker_file() == name)
    }

    /// All recognized ecosystems, in detection priority order.
    pub const ALL: &[Self] = &[Self::Node, Self::Rust];
}
