// src/lib.rs

pub mod cli;
pub mod config;
pub mod env;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod runner;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::errors::Result;
use crate::exec::{InvocationPlanner, ProcessSupervisor, StreamSink, TracingSink};
use crate::runner::{ConfigPlanner, ToolRunner};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - project file loading
/// - the line sink (captured tool output → tracing)
/// - the process supervisor backend
/// - the tool runner (run lock + staged invocation)
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    if args.list {
        print_stage_plan(&cfg, args.dry_run);
        return Ok(());
    }

    let project_dir = config_root_dir(&config_path);
    let sink: Arc<dyn StreamSink> = Arc::new(TracingSink::new(&cfg.tool.command));
    let backend = ProcessSupervisor::new();

    let runner = ToolRunner::new(cfg, project_dir, args.dry_run);
    runner.run(&backend, sink).await
}

/// Figure out the project directory the run lock lives in.
///
/// - If the config path has a non-empty parent (e.g. "project/Stagehand.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Stagehand.toml" (parent = ""),
///   we fall back to the current working directory "."
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// `--list` output: print each stage's resolved command line, execute nothing.
fn print_stage_plan(cfg: &ConfigFile, dry_run: bool) {
    for line in render_stage_plan(cfg, dry_run) {
        println!("{line}");
    }
    debug!("stage plan printed (no execution)");
}

/// The `--list` plan as displayable lines: a header, then one line per stage
/// with its fully resolved command line.
pub fn render_stage_plan(cfg: &ConfigFile, dry_run: bool) -> Vec<String> {
    let mut lines = vec![
        "stagehand stage plan".to_string(),
        format!("  tool: {} (role: {})", cfg.tool.command, cfg.tool.role),
    ];
    if dry_run {
        lines.push("  dry-run substitutions applied".to_string());
    }
    lines.push(String::new());

    let planner = ConfigPlanner::new(cfg, dry_run);
    for stage in &cfg.stages {
        match planner.invocation_for(&stage.name) {
            Ok(inv) => lines.push(format!("  {} -> {}", stage.name, inv.command_line())),
            // Unreachable for a validated config; keep the plan printable anyway.
            Err(err) => lines.push(format!("  {} -> <error: {err}>", stage.name)),
        }
    }
    lines
}
