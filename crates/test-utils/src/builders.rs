use std::collections::BTreeMap;
use std::path::PathBuf;

use stagehand::config::{ConfigFile, StageConfig, ToolSection};

/// Builder for a validated-shape [`ConfigFile`] without going through TOML.
///
/// Tests that exercise the loader/validator parse real TOML instead; this
/// builder is for everything downstream of validation.
pub struct ConfigFileBuilder {
    tool: ToolSection,
    stages: Vec<StageConfig>,
}

impl ConfigFileBuilder {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            tool: ToolSection {
                command: command.into(),
                args: Vec::new(),
                env: BTreeMap::new(),
                workdir: None,
                role: "tool".to_string(),
            },
            stages: Vec::new(),
        }
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.tool.role = role.into();
        self
    }

    pub fn base_args(mut self, args: &[&str]) -> Self {
        self.tool.args = args.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn tool_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tool.env.insert(key.into(), value.into());
        self
    }

    pub fn workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tool.workdir = Some(dir.into());
        self
    }

    pub fn with_stage(mut self, stage: StageConfig) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile {
            tool: self.tool,
            stages: self.stages,
        }
    }
}

/// Builder for one `[[stage]]` entry.
pub struct StageConfigBuilder {
    stage: StageConfig,
}

impl StageConfigBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            stage: StageConfig {
                name: name.into(),
                args: Vec::new(),
                env: BTreeMap::new(),
                dry_run: None,
            },
        }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.stage.args = args.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.stage.env.insert(key.into(), value.into());
        self
    }

    pub fn dry_run(mut self, substitute: impl Into<String>) -> Self {
        self.stage.dry_run = Some(substitute.into());
        self
    }

    pub fn build(self) -> StageConfig {
        self.stage
    }
}
