//! Types and traits for recording training metrics.
//!
//! ```rust
//! use volta_core::record::{Record, RecordValue};
//!
//! let mut record = Record::from_scalar("episode_reward", 12.5);
//! record.insert("map", RecordValue::String("Windcity".to_string()));
//! assert_eq!(record.get_scalar("episode_reward").unwrap(), 12.5);
//! ```
mod base;
mod buffered_recorder;
mod null_recorder;
mod recorder;
mod storage;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::{AggregateRecorder, Recorder};
pub use storage::RecordStorage;
