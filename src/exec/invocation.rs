// src/exec/invocation.rs

//! The `Invocation` value: one fully-resolved external-process launch.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Everything needed to launch one external process.
///
/// Built once per stage by an `InvocationPlanner` and then owned by the
/// invoker for the duration of that stage; nothing mutates it after
/// construction. An explicit value object, so what gets executed is visible
/// in logs and testable without spawning anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Executable to launch.
    pub program: String,
    /// Arguments passed verbatim, in order.
    pub args: Vec<String>,
    /// Environment entries applied over the parent's environment at spawn.
    /// Planners pass a fully collated mapping here (see `env::collate`).
    pub env: BTreeMap<String, String>,
    /// Working directory; `None` inherits the parent's cwd.
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            env: BTreeMap::new(),
            cwd: None,
        }
    }

    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// The command line as a single display string, for logs and launch
    /// errors. Not shell-quoted; diagnostics only.
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_joins_program_and_args() {
        let inv = Invocation::new("dbt", vec!["run".into(), "--models".into(), "m1".into()]);
        assert_eq!(inv.command_line(), "dbt run --models m1");
    }

    #[test]
    fn command_line_without_args_is_just_the_program() {
        let inv = Invocation::new("dbt", vec![]);
        assert_eq!(inv.command_line(), "dbt");
    }
}
