//! Record persistence
//!
//! The pipeline hands finished record sets to a [`RecordSink`]. The shipped
//! sink is [`json::JsonSaver`], which writes one pretty-printed JSON array per
//! record set.

use serde::Serialize;
use std::path::PathBuf;

pub mod json;

/// Output errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    SerializationError(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for a named set of records
pub trait RecordSink {
    /// Persist `records` under `name` and return where they went.
    ///
    /// A failed save must not leave a partial document behind.
    fn save<T: Serialize>(&self, name: &str, records: &[T]) -> OutputResult<PathBuf>;
}

impl<S: RecordSink + ?Sized> RecordSink for &S {
    fn save<T: Serialize>(&self, name: &str, records: &[T]) -> OutputResult<PathBuf> {
        (**self).save(name, records)
    }
}
