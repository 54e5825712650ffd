use super::{AggregateRecorder, Record};
use log::info;

/// Buffered recorder.
///
/// Keeps every record in memory. Used for inspecting per-episode metrics
/// after a training run, for example in tests.
#[derive(Default)]
pub struct BufferedRecorder {
    buf: Vec<Record>,
}

impl BufferedRecorder {
    /// Construct the recorder.
    pub fn new() -> Self {
        Self { buf: Vec::default() }
    }

    /// Returns an iterator over the records.
    pub fn iter(&self) -> std::slice::Iter<Record> {
        self.buf.iter()
    }

    /// Returns the number of stored records.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if no record has been stored.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl AggregateRecorder for BufferedRecorder {
    fn store(&mut self, record: Record) {
        self.buf.push(record);
    }

    fn flush(&mut self, step: i64) {
        info!("{} records buffered at step {}", self.buf.len(), step);
    }
}
