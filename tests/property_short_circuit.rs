// tests/property_short_circuit.rs

//! Property: for any stage list, the run plans and starts exactly the
//! prefix up to and including the first failing stage.

use std::sync::{Arc, Mutex};

use proptest::prelude::*;

use stagehand::errors::{Result as StagehandResult, StagehandError};
use stagehand::exec::{Invocation, InvocationPlanner, StagedInvoker, StreamSink, StreamSource};
use stagehand_test_utils::fake_backend::{FakeBackend, FakeStep};

/// Sink that drops everything; output content is irrelevant here.
struct NullSink;

impl StreamSink for NullSink {
    fn write_line(&self, _source: StreamSource, _line: &str) {}
}

struct CountingPlanner {
    planned: Mutex<Vec<String>>,
}

impl InvocationPlanner for CountingPlanner {
    fn invocation_for(&self, stage: &str) -> StagehandResult<Invocation> {
        self.planned.lock().unwrap().push(stage.to_string());
        Ok(Invocation::new("tool", vec![stage.to_string()]))
    }
}

// (number of stages, index of first failure or n for "none", failing code)
fn run_shape() -> impl Strategy<Value = (usize, usize, i32)> {
    (1usize..8).prop_flat_map(|n| (Just(n), 0..=n, 1..256i32))
}

proptest! {
    #[test]
    fn only_the_prefix_up_to_first_failure_runs(
        (num_stages, fail_at, fail_code) in run_shape()
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("tokio runtime");

        rt.block_on(async {
            let stages: Vec<String> =
                (0..num_stages).map(|i| format!("stage_{i}")).collect();

            let mut backend = FakeBackend::new();
            for i in 0..num_stages {
                let step = if i == fail_at {
                    FakeStep::exit(fail_code)
                } else {
                    FakeStep::exit(0)
                };
                backend = backend.with_step(step);
            }

            let planner = CountingPlanner { planned: Mutex::new(Vec::new()) };
            let invoker = StagedInvoker::new(&backend, "role");
            let result = invoker.run(&stages, &planner, Arc::new(NullSink)).await;

            let planned = planner.planned.lock().unwrap().clone();

            if fail_at >= num_stages {
                // No failing stage: everything runs, in order.
                prop_assert!(result.is_ok());
                prop_assert_eq!(planned, stages.clone());
                prop_assert_eq!(backend.invocation_count(), num_stages);
            } else {
                match result {
                    Err(StagehandError::Run(failure)) => {
                        prop_assert_eq!(&failure.stage, &stages[fail_at]);
                        prop_assert_eq!(failure.codes.get("role"), Some(&fail_code));
                    }
                    other => prop_assert!(false, "expected RunFailure, got {:?}", other),
                }
                // Exactly the prefix through the failing stage.
                prop_assert_eq!(planned, stages[..=fail_at].to_vec());
                prop_assert_eq!(backend.invocation_count(), fail_at + 1);
            }
            Ok(())
        })?;
    }
}
