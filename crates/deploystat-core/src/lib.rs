//! Core library for deploystat.
//!
//! Reads build and repository metadata, classifies deployment commits by
//! message pattern, and renders the result. Used by the `deploystat` CLI and
//! by anything that wants the same answers in-process.
//!
//! # Modules
//!
//! - [`classify`] - Deployment counting and status
//! - [`commit`] - Commit records and log parsing
//! - [`config`] - Configuration loading and management
//! - [`ecosystem`] - Manifest kinds the version is read from
//! - [`error`] - Error types and result aliases
//! - [`git`] - Thin facade over the `git` CLI
//! - [`info`] - The [`DeployInfo`] context and its [`InfoRecord`]
//! - [`manifest`] - Project version lookup
//! - [`pattern`] - Deployment message pattern
//! - [`render`] - Box-drawn text report
//! - [`repo`] - Repository queries with sentinel fallbacks
//! - [`snapshot`] - Values captured once at startup
//!
//! # Quick Start
//!
//! ```no_run
//! use camino::Utf8Path;
//! use deploystat_core::{ConfigLoader, DeployInfo};
//!
//! let config = ConfigLoader::new()
//!     .with_user_config(true)
//!     .load()
//!     .expect("Failed to load configuration");
//!
//! let info = DeployInfo::discover(Utf8Path::new("."), &config);
//! let record = info.query();
//! println!("{} is {}", record.commit_hash(), record.deploy_status());
//! ```
#![deny(unsafe_code)]

pub mod classify;

pub mod commit;

pub mod config;

pub mod ecosystem;

pub mod error;

pub mod git;

pub mod info;

pub mod manifest;

pub mod pattern;

pub mod render;

pub mod repo;

pub mod snapshot;

pub use classify::{DeployStatus, DeploymentAssessment, DeploymentSummary};
pub use commit::CommitRecord;
pub use config::{Config, ConfigLoader, LogLevel};
pub use error::{ConfigError, ConfigResult};
pub use info::{DeployInfo, InfoRecord};
pub use pattern::{ClassificationPattern, PatternSource};
pub use render::render_report;
pub use repo::{GitRepository, Repository};
pub use snapshot::Snapshot;
