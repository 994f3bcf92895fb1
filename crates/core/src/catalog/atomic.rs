//! Atomic file replacement: write a sibling temp file, fsync, rename.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::error::CommitError;

/// Replaces `path` with `contents` so readers see either the old or the new file.
///
/// The temp file lives in the same directory as the target so the final
/// rename never crosses filesystems.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), CommitError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| CommitError::write(&dir, e))?;

    let tmp_path = temp_path_for(path, &dir);
    let result = write_and_rename(&tmp_path, path, contents);
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

fn temp_path_for(path: &Path, dir: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "catalog".to_string());
    dir.join(format!(".{}.tmp-{}", file_name, uuid::Uuid::new_v4().simple()))
}

fn write_and_rename(tmp_path: &Path, path: &Path, contents: &[u8]) -> Result<(), CommitError> {
    let mut file = File::create(tmp_path).map_err(|e| CommitError::write(tmp_path, e))?;
    file.write_all(contents)
        .map_err(|e| CommitError::write(tmp_path, e))?;
    file.sync_all().map_err(|e| CommitError::write(tmp_path, e))?;
    drop(file);

    fs::rename(tmp_path, path).map_err(|e| CommitError::write(path, e))?;
    Ok(())
}
