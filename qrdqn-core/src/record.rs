//! Types and traits for recording training metrics.
//!
//! # Basic Usage
//!
//! ```rust
//! use qrdqn_core::record::{Record, RecordValue};
//!
//! let episode = 1;
//! let reward = 0.5f32;
//!
//! let mut record = Record::empty();
//! record.insert("episode", RecordValue::Scalar(episode as f32));
//! record.insert("reward", RecordValue::Scalar(reward));
//! assert_eq!(record.get_scalar("reward").unwrap(), 0.5);
//! ```
//!
//! The [`Trainer`](crate::Trainer) stores one record per episode into an
//! [`AggregateRecorder`] and flushes it periodically.
mod base;
mod buffered_recorder;
mod null_recorder;
mod recorder;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::AggregateRecorder;
