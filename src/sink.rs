use std::fs;
use std::path::PathBuf;

use serde_json::Value;
use tracing::{info, warn};

/// Append-batch JSON sink. Records buffer in memory; every `flush_every`
/// records the existing file array is read, extended and rewritten. A
/// malformed file is overwritten with the current batch.
pub struct ResultSink {
    path: PathBuf,
    flush_every: usize,
    buffer: Vec<Value>,
}

impl ResultSink {
    pub fn new(data_dir: PathBuf, file_name: impl Into<String>, flush_every: usize) -> std::io::Result<Self> {
        fs::create_dir_all(&data_dir)?;
        Ok(Self {
            path: data_dir.join(file_name.into()),
            flush_every,
            buffer: Vec::new(),
        })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Buffers a record and flushes when the batch threshold is reached.
    /// Returns whether a flush happened.
    pub fn push(&mut self, record: Value) -> std::io::Result<bool> {
        self.buffer.push(record);
        if self.buffer.len() >= self.flush_every {
            self.flush()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Writes all buffered records, extending the existing file array.
    pub fn flush(&mut self) -> std::io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let mut records = match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<Vec<Value>>(&bytes) {
                Ok(existing) => existing,
                Err(err) => {
                    warn!(path = %self.path.display(), error = %err, "result file unreadable, overwriting");
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };
        records.append(&mut self.buffer);
        let payload = serde_json::to_vec(&records).map_err(std::io::Error::other)?;
        fs::write(&self.path, payload)?;
        info!(path = %self.path.display(), total = records.len(), "saved results");
        Ok(())
    }
}
