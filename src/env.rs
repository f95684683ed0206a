// src/env.rs

//! Environment collation for stage invocations.
//!
//! The environment a stage's process sees is built from layers, later layers
//! overriding earlier ones:
//!
//! 1. the ambient process environment (terminal env),
//! 2. `[tool].env` from the project file,
//! 3. the stage's own `env` table.
//!
//! Collation is a pure function of its inputs so the planner stays
//! deterministic and testable.

use std::collections::BTreeMap;

/// Collate environment layers into the final mapping for one invocation.
///
/// `layers` are applied in order; an entry in a later layer overrides the
/// same key from any earlier layer.
pub fn collate<'a, I>(ambient: &BTreeMap<String, String>, layers: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = &'a BTreeMap<String, String>>,
{
    let mut merged = ambient.clone();
    for layer in layers {
        for (key, value) in layer {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// Snapshot the ambient process environment.
///
/// Variables whose name or value is not valid Unicode are skipped; the tools
/// we wrap read their configuration from well-formed variables.
pub fn ambient_env() -> BTreeMap<String, String> {
    std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect()
}
