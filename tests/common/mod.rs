pub use stagehand_test_utils::{init_tracing, with_timeout};
