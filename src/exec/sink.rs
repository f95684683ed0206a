// src/exec/sink.rs

//! Line sinks for captured process output.
//!
//! A single invocation drains stdout and stderr concurrently; both drain
//! tasks share one sink, so implementations must accept interleaved
//! `write_line` calls from two tasks. Each call delivers one complete line;
//! partial lines never cross the trait boundary, which is what keeps the
//! interleaving safe.

use std::fmt;

use tracing::{info, warn};

/// Which stream of the child a captured line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSource {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamSource::Stdout => f.write_str("stdout"),
            StreamSource::Stderr => f.write_str("stderr"),
        }
    }
}

/// Destination for captured output lines.
///
/// Shared as `Arc<dyn StreamSink>` across the two drain tasks of one
/// invocation, and across all stages of a run (stages are sequential, so
/// cross-stage writes never interleave).
pub trait StreamSink: Send + Sync {
    fn write_line(&self, source: StreamSource, line: &str);
}

/// Production sink: forwards captured lines into `tracing`.
///
/// Stdout lines are logged at `info`, stderr lines at `warn`, both tagged
/// with the tool name so multi-tool pipelines stay attributable.
pub struct TracingSink {
    tool: String,
}

impl TracingSink {
    pub fn new(tool: impl Into<String>) -> Self {
        Self { tool: tool.into() }
    }
}

impl StreamSink for TracingSink {
    fn write_line(&self, source: StreamSource, line: &str) {
        match source {
            StreamSource::Stdout => info!(tool = %self.tool, "{}", line),
            StreamSource::Stderr => warn!(tool = %self.tool, "{}", line),
        }
    }
}
