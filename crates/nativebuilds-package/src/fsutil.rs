//! Filesystem helpers shared by the resolution and packaging passes

use std::fs;
use std::io;
use std::path::Path;

/// Write `contents` to `path` only if the file is missing or differs.
///
/// Parent directories are created on demand. Returns `true` when the file
/// was written.
pub fn write_if_different(path: &Path, contents: &[u8]) -> io::Result<bool> {
    match fs::read(path) {
        Ok(existing) if existing == contents => return Ok(false),
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    Ok(true)
}
