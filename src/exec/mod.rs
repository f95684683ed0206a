// src/exec/mod.rs

//! Process execution layer.
//!
//! This module launches the external tool's stage processes with
//! `tokio::process::Command`, captures their output line by line, and
//! reports exit outcomes to the staged invoker.
//!
//! - [`invocation`] defines the [`Invocation`] value describing one launch.
//! - [`sink`] defines where captured output lines go.
//! - [`supervisor`] owns single-process supervision: concurrent stdout and
//!   stderr drains plus the process wait, joined before the outcome is
//!   reported. Also home of the [`ProcessBackend`] trait that tests can
//!   replace with a fake implementation.
//! - [`invoker`] runs an ordered stage sequence on top of a backend,
//!   short-circuiting on the first failure.

pub mod invocation;
pub mod invoker;
pub mod sink;
pub mod supervisor;

pub use invocation::Invocation;
pub use invoker::{InvocationPlanner, StagedInvoker};
pub use sink::{StreamSink, StreamSource, TracingSink};
pub use supervisor::{ExitOutcome, ProcessBackend, ProcessSupervisor};
