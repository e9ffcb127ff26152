//! Shared types, error model, and configuration for Boardroom.
//!
//! This crate is the foundation depended on by all other Boardroom crates.
//! It provides:
//! - [`BoardroomError`], the unified error type
//! - Domain types ([`Stage`], [`Artifact`], [`RunManifest`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AgentConfig, AppConfig, PathsConfig, RetryConfig, config_dir, config_file_path, load_config,
    load_config_from, resolve_api_key,
};
pub use error::{BoardroomError, Result};
pub use types::{Artifact, ArtifactRecord, CURRENT_SCHEMA_VERSION, RunManifest, Stage};
