// src/config/validate.rs

use std::collections::BTreeSet;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, StagehandError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::StagehandError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.tool, raw.stage))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_stages(cfg)?;
    validate_tool_section(cfg)?;
    validate_stage_names(cfg)?;
    Ok(())
}

fn ensure_has_stages(cfg: &RawConfigFile) -> Result<()> {
    if cfg.stage.is_empty() {
        return Err(StagehandError::ConfigError(
            "project file must contain at least one [[stage]] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_tool_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.tool.command.trim().is_empty() {
        return Err(StagehandError::ConfigError(
            "[tool].command must not be empty".to_string(),
        ));
    }
    if cfg.tool.role.trim().is_empty() {
        return Err(StagehandError::ConfigError(
            "[tool].role must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_stage_names(cfg: &RawConfigFile) -> Result<()> {
    let mut seen = BTreeSet::new();
    for stage in cfg.stage.iter() {
        if stage.name.trim().is_empty() {
            return Err(StagehandError::ConfigError(
                "[[stage]].name must not be empty".to_string(),
            ));
        }
        if !seen.insert(stage.name.as_str()) {
            return Err(StagehandError::ConfigError(format!(
                "duplicate stage name '{}'",
                stage.name
            )));
        }
        if let Some(sub) = &stage.dry_run {
            if sub.trim().is_empty() {
                return Err(StagehandError::ConfigError(format!(
                    "stage '{}' has an empty `dry_run` substitution",
                    stage.name
                )));
            }
        }
    }
    Ok(())
}
