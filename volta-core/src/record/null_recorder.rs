use super::{AggregateRecorder, Record, Recorder};

/// A recorder that discards every record.
///
/// Used for runs that only need the saved model, e.g. training without
/// TensorBoard output.
#[derive(Debug, Default)]
pub struct NullRecorder;

impl Recorder for NullRecorder {
    fn write(&mut self, _record: Record) {}
}

impl AggregateRecorder for NullRecorder {
    fn store(&mut self, _record: Record) {}

    fn flush(&mut self, _step: i64) {}
}
