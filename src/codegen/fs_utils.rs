//! Filesystem utilities for code generation

use std::fs;
use std::io;
use std::path::Path;

/// Create a file for writing, creating parent directories if needed
pub fn create_file<P: AsRef<Path>>(path: P) -> io::Result<fs::File> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::File::create(path)
}

/// Create an output directory (and its parents) if it does not exist
pub fn ensure_dir<P: AsRef<Path>>(path: P) -> io::Result<()> {
    fs::create_dir_all(path)
}
