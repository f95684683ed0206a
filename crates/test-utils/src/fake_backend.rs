use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use stagehand::errors::{Result, StagehandError};
use stagehand::exec::{ExitOutcome, Invocation, ProcessBackend, StreamSink, StreamSource};

/// One scripted invocation outcome for [`FakeBackend`].
#[derive(Debug, Clone)]
pub struct FakeStep {
    pub lines: Vec<(StreamSource, String)>,
    pub exit_code: i32,
    pub launch_error: bool,
}

impl FakeStep {
    /// A step that exits with the given code (no output).
    pub fn exit(code: i32) -> Self {
        Self {
            lines: Vec::new(),
            exit_code: code,
            launch_error: false,
        }
    }

    /// A step that fails to launch entirely.
    pub fn launch_error() -> Self {
        Self {
            lines: Vec::new(),
            exit_code: -1,
            launch_error: true,
        }
    }

    /// Add a line emitted to the sink before the step resolves.
    pub fn line(mut self, source: StreamSource, line: impl Into<String>) -> Self {
        self.lines.push((source, line.into()));
        self
    }
}

/// A fake process backend that:
/// - records every invocation it receives (command, args, env, cwd)
/// - consumes a script of [`FakeStep`]s, one per invocation, in order
/// - defaults to "exit 0, no output" once the script is exhausted.
#[derive(Default)]
pub struct FakeBackend {
    script: Mutex<VecDeque<FakeStep>>,
    invocations: Arc<Mutex<Vec<Invocation>>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_step(self, step: FakeStep) -> Self {
        self.script.lock().unwrap().push_back(step);
        self
    }

    /// Everything invoked so far, in order.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }

    /// Number of invocations so far (the "was stage N+1 ever started" probe).
    pub fn invocation_count(&self) -> usize {
        self.invocations.lock().unwrap().len()
    }
}

impl ProcessBackend for FakeBackend {
    fn invoke<'a>(
        &'a self,
        invocation: Invocation,
        sink: Arc<dyn StreamSink>,
    ) -> Pin<Box<dyn Future<Output = Result<ExitOutcome>> + Send + 'a>> {
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| FakeStep::exit(0));
        let invocations = Arc::clone(&self.invocations);

        Box::pin(async move {
            let command = invocation.command_line();
            invocations.lock().unwrap().push(invocation);

            if step.launch_error {
                return Err(StagehandError::Launch {
                    command,
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "fake launch failure",
                    ),
                });
            }

            for (source, line) in &step.lines {
                sink.write_line(*source, line);
            }

            Ok(ExitOutcome {
                code: step.exit_code,
                stdout_drained: true,
                stderr_drained: true,
            })
        })
    }
}
