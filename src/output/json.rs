//! JSON document writer

use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::output::{OutputError, OutputResult, RecordSink};

/// Writes `<dir>/<name>.json` as a pretty-printed UTF-8 array
#[derive(Debug, Clone)]
pub struct JsonSaver {
    dir: PathBuf,
}

impl JsonSaver {
    /// Saver rooted at `dir`, created on first save if missing
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Target path for `name`
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }
}

impl RecordSink for JsonSaver {
    /// Write through a temp file in the same directory, then rename over the
    /// target, so readers see either the old document or the new one.
    ///
    /// Blocks the calling thread. The pipeline calls this between stages with
    /// nothing else in flight, and the documents are small.
    fn save<T: Serialize>(&self, name: &str, records: &[T]) -> OutputResult<PathBuf> {
        let path = self.path_for(name);
        debug!(path = %path.display(), records = records.len(), "Saving records");

        std::fs::create_dir_all(&self.dir).map_err(|e| {
            OutputError::IoError(format!("Failed to create {}: {e}", self.dir.display()))
        })?;

        // Two-space indent, non-ASCII kept as-is.
        let json = serde_json::to_string_pretty(records)
            .map_err(|e| OutputError::SerializationError(e.to_string()))?;

        let mut temp_file = tempfile::NamedTempFile::new_in(&self.dir)
            .map_err(|e| OutputError::IoError(format!("Failed to create temp file: {e}")))?;
        temp_file
            .write_all(json.as_bytes())
            .map_err(|e| OutputError::IoError(format!("Failed to write temp file: {e}")))?;
        temp_file
            .as_file()
            .sync_all()
            .map_err(|e| OutputError::IoError(format!("Failed to sync temp file: {e}")))?;
        temp_file
            .persist(&path)
            .map_err(|e| OutputError::IoError(format!("Failed to persist {}: {e}", path.display())))?;

        info!(path = %path.display(), records = records.len(), "Records saved");
        Ok(path)
    }
}
