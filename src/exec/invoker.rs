// src/exec/invoker.rs

//! Sequential staged invocation with short-circuit on first failure.
//!
//! A run walks an ordered list of stage names. For each stage it asks the
//! planner for a concrete [`Invocation`], hands it to the process backend,
//! and inspects the exit code. A non-zero exit aborts the run: later stages
//! may depend on earlier stages' filesystem effects, so running them after a
//! failure would produce misleading results. They are never constructed,
//! let alone started.

use std::sync::Arc;

use tracing::{error, info};

use crate::errors::{Result, RunFailure};
use crate::exec::invocation::Invocation;
use crate::exec::sink::StreamSink;
use crate::exec::supervisor::ProcessBackend;

/// Produces the concrete invocation for a stage name.
///
/// This is the seam to the surrounding configuration machinery: dry-run
/// command substitution, environment collation and argument assembly all
/// happen behind this trait, never inside the invoker.
pub trait InvocationPlanner {
    fn invocation_for(&self, stage: &str) -> Result<Invocation>;
}

/// Closures work as planners directly, which keeps tests terse.
impl<F> InvocationPlanner for F
where
    F: Fn(&str) -> Result<Invocation>,
{
    fn invocation_for(&self, stage: &str) -> Result<Invocation> {
        self(stage)
    }
}

/// Runs an ordered sequence of named stages against one tool.
///
/// Stages execute strictly sequentially; stage N+1's invocation is not even
/// planned until stage N has exited 0. Holds no per-run mutable state, so
/// one invoker can serve any number of independent runs.
pub struct StagedInvoker<'a> {
    backend: &'a dyn ProcessBackend,
    /// Role label for error attribution (e.g. "transformer").
    role: String,
}

impl<'a> StagedInvoker<'a> {
    pub fn new(backend: &'a dyn ProcessBackend, role: impl Into<String>) -> Self {
        Self {
            backend,
            role: role.into(),
        }
    }

    /// Run every stage in order, stopping at the first failure.
    ///
    /// - A stage exiting non-zero yields `RunFailure { stage, codes:
    ///   {role: code} }`; remaining stages never start.
    /// - A stage that cannot even be launched surfaces the backend's
    ///   `Launch` error unchanged; the stage identity is attached via the
    ///   error log.
    pub async fn run(
        &self,
        stages: &[String],
        planner: &dyn InvocationPlanner,
        sink: Arc<dyn StreamSink>,
    ) -> Result<()> {
        for stage in stages {
            let invocation = planner.invocation_for(stage)?;
            info!(stage = %stage, command = %invocation, "starting stage");

            let outcome = match self.backend.invoke(invocation, sink.clone()).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    error!(stage = %stage, role = %self.role, error = %err, "stage failed to run");
                    return Err(err);
                }
            };

            if !outcome.success() {
                error!(
                    stage = %stage,
                    role = %self.role,
                    exit_code = outcome.code,
                    "stage exited non-zero; aborting run"
                );
                return Err(RunFailure::for_stage(stage, &self.role, outcome.code).into());
            }

            info!(stage = %stage, "stage completed");
        }

        Ok(())
    }
}
