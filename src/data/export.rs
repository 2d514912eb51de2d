use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Serialize;

use crate::error::{Error, Result};

/// Writes text to a single file path.
///
/// Every failure, including a missing parent directory, surfaces as
/// [`Error::Io`]. Use [`crate::fs::ensure_directory`] first when the parent
/// may not exist yet.
#[derive(Debug, Clone)]
pub struct Exporter {
    path: PathBuf,
}

impl Exporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the file's content with `message`, creating the file if needed.
    pub fn write_text(&self, message: &str) -> Result<()> {
        fs::write(&self.path, message).map_err(|e| Error::io(&self.path, e))?;
        debug!("wrote {} bytes to {}", message.len(), self.path.display());
        Ok(())
    }

    /// Add `message` to the end of the file, creating the file if needed.
    pub fn append_text(&self, message: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::io(&self.path, e))?;
        file.write_all(message.as_bytes())
            .map_err(|e| Error::io(&self.path, e))?;
        debug!("appended {} bytes to {}", message.len(), self.path.display());
        Ok(())
    }

    /// Replace the file's content with `value` as pretty-printed JSON.
    pub fn write_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let text = serde_json::to_string_pretty(value)
            .map_err(|e| Error::parse(&self.path, e.to_string()))?;
        self.write_text(&text)
    }
}
