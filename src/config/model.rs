// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

/// Top-level project file as read from TOML, prior to validation.
///
/// ```toml
/// [tool]
/// command = "dbt"
/// role = "transformer"
/// env = { DBT_PROFILES_DIR = "profiles" }
///
/// [[stage]]
/// name = "clean"
///
/// [[stage]]
/// name = "deps"
///
/// [[stage]]
/// name = "run"
/// args = ["--models", "my_model"]
/// dry_run = "compile"
/// ```
///
/// Stages are an array of tables because their order is the execution order.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// The external tool from `[tool]`.
    pub tool: ToolSection,

    /// Ordered stages from `[[stage]]`.
    #[serde(default)]
    pub stage: Vec<StageConfig>,
}

/// `[tool]` section: everything shared by all stages of the run.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolSection {
    /// Executable to invoke for every stage.
    pub command: String,

    /// Base arguments prepended to every stage's argument list.
    #[serde(default)]
    pub args: Vec<String>,

    /// Environment entries applied to every stage, layered over the ambient
    /// process environment.
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Working directory for the tool. Defaults to the process cwd.
    #[serde(default)]
    pub workdir: Option<PathBuf>,

    /// Role label used for error attribution (e.g. "transformer").
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "tool".to_string()
}

/// One `[[stage]]` entry.
///
/// The concrete argv of a stage is:
/// `tool.args ++ [subcommand] ++ stage.args`, where `subcommand` is the
/// stage name, or its `dry_run` replacement when running with `--dry-run`.
#[derive(Debug, Clone, Deserialize)]
pub struct StageConfig {
    /// Stage name; doubles as the tool subcommand (e.g. "deps" → `dbt deps`).
    pub name: String,

    /// Extra arguments appended after the subcommand.
    #[serde(default)]
    pub args: Vec<String>,

    /// Per-stage environment entries, layered over `[tool].env`.
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Replacement subcommand under `--dry-run` (e.g. "compile").
    #[serde(default)]
    pub dry_run: Option<String>,
}

/// Validated project file.
///
/// Production code constructs this via `TryFrom<RawConfigFile>` (see
/// `validate.rs`); the fields stay public so test builders can assemble
/// already-valid configs without a TOML round trip.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub tool: ToolSection,
    pub stages: Vec<StageConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(tool: ToolSection, stages: Vec<StageConfig>) -> Self {
        Self { tool, stages }
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<String> {
        self.stages.iter().map(|s| s.name.clone()).collect()
    }

    /// Look up a stage by name.
    pub fn stage(&self, name: &str) -> Option<&StageConfig> {
        self.stages.iter().find(|s| s.name == name)
    }
}
