// src/runner.rs

//! The tool runner: glue between the project file and the staged invoker.
//!
//! This is the layer that knows about configuration. It turns the `[tool]`
//! section plus one `[[stage]]` entry into a concrete [`Invocation`]
//! (argument assembly, environment collation, dry-run substitution), holds
//! the run lock for the duration of the run, and delegates stage sequencing
//! to [`StagedInvoker`].

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::ConfigFile;
use crate::env;
use crate::errors::{Result, StagehandError};
use crate::exec::{
    Invocation, InvocationPlanner, ProcessBackend, StagedInvoker, StreamSink,
};

/// Planner backed by the project file.
///
/// Pure function of (config, dry-run flag, ambient-env snapshot); the
/// snapshot is taken once at construction so every stage of a run sees the
/// same ambient environment.
pub struct ConfigPlanner<'a> {
    config: &'a ConfigFile,
    dry_run: bool,
    ambient: BTreeMap<String, String>,
}

impl<'a> ConfigPlanner<'a> {
    pub fn new(config: &'a ConfigFile, dry_run: bool) -> Self {
        Self {
            config,
            dry_run,
            ambient: env::ambient_env(),
        }
    }

    #[cfg(test)]
    fn with_ambient(config: &'a ConfigFile, dry_run: bool, ambient: BTreeMap<String, String>) -> Self {
        Self {
            config,
            dry_run,
            ambient,
        }
    }
}

impl InvocationPlanner for ConfigPlanner<'_> {
    fn invocation_for(&self, stage: &str) -> Result<Invocation> {
        let stage_cfg = self.config.stage(stage).ok_or_else(|| {
            StagehandError::ConfigError(format!("unknown stage '{stage}' in project file"))
        })?;
        let tool = &self.config.tool;

        // Stage name doubles as the tool subcommand, unless --dry-run swaps
        // in the stage's substitute (e.g. `compile` instead of `run`).
        let subcommand = match (&stage_cfg.dry_run, self.dry_run) {
            (Some(substitute), true) => substitute.as_str(),
            _ => stage_cfg.name.as_str(),
        };

        let mut args = tool.args.clone();
        args.push(subcommand.to_string());
        args.extend(stage_cfg.args.iter().cloned());

        let merged_env = env::collate(&self.ambient, [&tool.env, &stage_cfg.env]);

        let mut invocation = Invocation::new(&tool.command, args).with_env(merged_env);
        if let Some(workdir) = &tool.workdir {
            invocation = invocation.with_cwd(workdir);
        }

        Ok(invocation)
    }
}

/// Scoped run lock: acquired before the first stage, released on every exit
/// path (success, failure, unwind) via `Drop`.
///
/// Backed by exclusive creation of a lock file next to the project file, so
/// two concurrent runs against the same project fail fast instead of
/// trampling each other's stage side effects.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    pub const FILE_NAME: &'static str = ".stagehand.lock";

    pub fn acquire(project_dir: &Path) -> Result<Self> {
        let path = project_dir.join(Self::FILE_NAME);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => {
                debug!(lock = %path.display(), "acquired run lock");
                Ok(Self { path })
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                Err(StagehandError::ConfigError(format!(
                    "another run appears to be in progress (lock file {} exists); \
                     remove it if that run is dead",
                    path.display()
                )))
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            // Nothing useful to do beyond telling the operator.
            tracing::warn!(lock = %self.path.display(), error = %err, "failed to remove run lock");
        }
    }
}

/// Runs the whole staged pipeline of one tool, as declared in the project
/// file.
pub struct ToolRunner {
    config: ConfigFile,
    project_dir: PathBuf,
    dry_run: bool,
}

impl ToolRunner {
    pub fn new(config: ConfigFile, project_dir: impl Into<PathBuf>, dry_run: bool) -> Self {
        Self {
            config,
            project_dir: project_dir.into(),
            dry_run,
        }
    }

    /// Execute every stage in order against `backend`, streaming output into
    /// `sink`. Returns the first failure, if any.
    pub async fn run(&self, backend: &dyn ProcessBackend, sink: Arc<dyn StreamSink>) -> Result<()> {
        let stages = self.config.stage_names();
        info!(
            tool = %self.config.tool.command,
            role = %self.config.tool.role,
            ?stages,
            dry_run = self.dry_run,
            "starting staged run"
        );

        let _lock = RunLock::acquire(&self.project_dir)?;

        let planner = ConfigPlanner::new(&self.config, self.dry_run);
        let invoker = StagedInvoker::new(backend, &self.config.tool.role);
        invoker.run(&stages, &planner, sink).await?;

        info!(tool = %self.config.tool.command, "staged run completed");
        Ok(())
    }
}
