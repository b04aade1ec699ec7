use crate::error::Result;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Fully written and synced sibling of `path`, ready to be renamed into place.
fn stage_beside(path: &Path, data: &[u8]) -> Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    Ok(tmp)
}

/// Replace `path` with `data`; readers see either the old or the new file.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    stage_beside(path, data)?
        .persist(path)
        .map_err(|e| e.error)?;
    Ok(())
}

/// Create `path` unless it exists. Returns whether this call wrote it.
///
/// A config created by someone else between the check and the rename is
/// left untouched.
pub fn write_if_missing(path: &Path, data: &[u8]) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    match stage_beside(path, data)?.persist_noclobber(path) {
        Ok(_) => Ok(true),
        Err(e) if e.error.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e.error.into()),
    }
}
