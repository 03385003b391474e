//! Writing rendered reports to disk.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::TfaError;

/// Writes `data` to `path` through a temporary sibling file and a rename, so
/// the target either keeps its old content or receives the whole new one.
/// Missing parent directories are created.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<(), TfaError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| TfaError::Report(format!("not a file path: {}", path.display())))?;

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(file_name);
    tmp_name.push(format!(".tmp-{}", std::process::id()));
    let tmp_path = parent.join(tmp_name);

    let result = write_and_sync(&tmp_path, data).and_then(|()| {
        fs::rename(&tmp_path, path)?;
        Ok(())
    });

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    } else {
        debug!(path = %path.display(), bytes = data.len(), "wrote report");
    }
    result
}

fn write_and_sync(path: &Path, data: &[u8]) -> Result<(), TfaError> {
    let mut file = fs::File::create(path)?;
    file.write_all(data)?;
    file.sync_all()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
