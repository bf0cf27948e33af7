//! TensorBoard recorder for volta.
use log::warn;
use std::path::Path;
use tensorboard_rs::summary_writer::SummaryWriter;
use volta_core::record::{AggregateRecorder, Record, RecordStorage, RecordValue, Recorder};

/// Write records to TFRecord.
///
/// Scalars are written as they are. A 1-D array is written as its mean.
/// Strings are ignored.
pub struct TensorboardRecorder {
    writer: SummaryWriter,
    step_key: String,
    storage: RecordStorage,
}

impl TensorboardRecorder {
    /// Construct a [`TensorboardRecorder`].
    ///
    /// TFRecord will be stored in `logdir`.
    pub fn new<P: AsRef<Path>>(logdir: P) -> Self {
        Self {
            writer: SummaryWriter::new(logdir),
            step_key: "step".to_string(),
            storage: RecordStorage::new(),
        }
    }
}

impl Recorder for TensorboardRecorder {
    /// Write a given [`Record`] into a TFRecord.
    ///
    /// The step is taken from the `"step"` scalar. Records without it are dropped.
    fn write(&mut self, record: Record) {
        let step = match record.get_scalar(&self.step_key) {
            Ok(v) => v as usize,
            Err(e) => {
                warn!("Dropped a record without step: {}", e);
                return;
            }
        };

        for (k, v) in record.iter() {
            if *k == self.step_key {
                continue;
            }
            match v {
                RecordValue::Scalar(v) => self.writer.add_scalar(k, *v, step),
                RecordValue::Array1(data) if !data.is_empty() => {
                    let mean = data.iter().sum::<f32>() / data.len() as f32;
                    self.writer.add_scalar(k, mean, step)
                }
                _ => {}
            }
        }
        self.writer.flush();
    }
}

impl AggregateRecorder for TensorboardRecorder {
    fn store(&mut self, record: Record) {
        self.storage.store(record);
    }

    fn flush(&mut self, step: i64) {
        if let Some(record) = self.storage.aggregate(step) {
            self.write(record);
        }
    }
}
