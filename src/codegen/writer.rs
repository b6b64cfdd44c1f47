//! Atomic artifact writes.

use crate::codegen::CodegenError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// New content was written.
    Written,
    /// The target already held identical bytes; nothing was touched.
    Unchanged,
}

/// Async entry point used by the translator.
///
/// The compare and directory setup go through `tokio::fs`; the temp file and
/// rename run on the blocking pool.
pub async fn write_artifact(path: &Path, contents: &str) -> Result<WriteOutcome, CodegenError> {
    if let Ok(existing) = tokio::fs::read(path).await {
        if existing == contents.as_bytes() {
            return Ok(WriteOutcome::Unchanged);
        }
    }

    let dir = target_dir(path);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| CodegenError::io(&dir, e))?;

    let target = path.to_path_buf();
    let contents = contents.to_string();
    tokio::task::spawn_blocking(move || replace(&dir, &target, &contents))
        .await
        .map_err(|e| CodegenError::io(path, std::io::Error::new(std::io::ErrorKind::Other, e)))?
}

/// Replace `path` with `contents` so the old content is never partially
/// overwritten: the bytes go to a temp file in the same directory which is
/// then renamed over the target.
pub fn write_atomic(path: &Path, contents: &str) -> Result<WriteOutcome, CodegenError> {
    if let Ok(existing) = std::fs::read(path) {
        if existing == contents.as_bytes() {
            return Ok(WriteOutcome::Unchanged);
        }
    }

    let dir = target_dir(path);
    std::fs::create_dir_all(&dir).map_err(|e| CodegenError::io(&dir, e))?;
    replace(&dir, path, contents)
}

fn target_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn replace(dir: &Path, path: &Path, contents: &str) -> Result<WriteOutcome, CodegenError> {
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| CodegenError::io(dir, e))?;
    if let Err(e) = fill(&mut tmp, contents) {
        return Err(CodegenError::io(tmp.path(), e));
    }
    tmp.persist(path).map_err(|e| CodegenError::io(path, e.error))?;
    Ok(WriteOutcome::Written)
}

fn fill(tmp: &mut NamedTempFile, contents: &str) -> std::io::Result<()> {
    tmp.write_all(contents.as_bytes())?;
    tmp.flush()?;
    tmp.as_file().sync_all()
}
