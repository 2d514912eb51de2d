//! File-system helpers.

use std::fs;
use std::io;
use std::path::Path;

use log::debug;

use crate::error::{Error, Result};

/// Ensure a directory exists, creating it and any missing parents.
///
/// Does nothing when `path` is already a directory. Fails with [`Error::Io`]
/// when `path`, or one of its ancestors, exists as something else.
pub fn ensure_directory(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.is_dir() {
        return Ok(());
    }
    if path.exists() {
        return Err(Error::io(
            path,
            io::Error::new(io::ErrorKind::AlreadyExists, "exists and is not a directory"),
        ));
    }
    fs::create_dir_all(path).map_err(|e| Error::io(path, e))?;
    debug!("created directory {}", path.display());
    Ok(())
}
