// src/errors.rs

//! Crate-wide error types and helpers.

use std::collections::BTreeMap;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StagehandError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// The stage's process could not be started at all (missing executable,
    /// permission denied, bad working directory). Carries the attempted
    /// command line for diagnostics.
    #[error("cannot start `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// A stage's process started and ran but exited non-zero.
    #[error(transparent)]
    Run(#[from] RunFailure),

    /// The invocation was cancelled while its child was in flight. The child
    /// has been killed and both streams drained by the time this is returned.
    #[error("`{command}` cancelled while running")]
    Cancelled { command: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Terminal failure of a staged run: the first stage that exited non-zero,
/// plus a role → exit-code mapping for the caller's error report.
///
/// Later stages are never started once this is constructed; external tools
/// are assumed stateful across stages, so nothing is retried or rolled back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("stage `{stage}` failed")]
pub struct RunFailure {
    /// Name of the failing stage (e.g. "deps").
    pub stage: String,
    /// Exit code keyed by the role label of the tool being run
    /// (e.g. `{"transformer": 1}`).
    pub codes: BTreeMap<String, i32>,
}

impl RunFailure {
    /// Build the failure for a single role/exit-code pair, which is all a
    /// sequential single-tool run ever produces.
    pub fn for_stage(stage: impl Into<String>, role: impl Into<String>, code: i32) -> Self {
        let mut codes = BTreeMap::new();
        codes.insert(role.into(), code);
        Self {
            stage: stage.into(),
            codes,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, StagehandError>;
