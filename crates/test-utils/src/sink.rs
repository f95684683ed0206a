use std::sync::{Arc, Mutex};

use stagehand::exec::{StreamSink, StreamSource};

/// A sink that records every captured line in order, for assertions.
///
/// Clone-cheap: clones share the same buffer.
#[derive(Clone, Default)]
pub struct BufferSink {
    lines: Arc<Mutex<Vec<(StreamSource, String)>>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured (source, line) pairs, in arrival order.
    pub fn lines(&self) -> Vec<(StreamSource, String)> {
        self.lines.lock().unwrap().clone()
    }

    /// Just the line texts, in arrival order.
    pub fn texts(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .map(|(_, line)| line.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().unwrap().is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().unwrap().len()
    }
}

impl StreamSink for BufferSink {
    fn write_line(&self, source: StreamSource, line: &str) {
        self.lines.lock().unwrap().push((source, line.to_string()));
    }
}
