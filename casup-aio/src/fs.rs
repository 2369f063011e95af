/*
File: casup-aio/src/fs.rs
Purpose: Synchronous filesystem operations used around uploader invocations.
*/
use std::{
    fs::{self, File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
};

use casup_common::error::{CasupError, Result};
use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, error, warn};

/// Creates a directory and all its parent components if they are missing.
pub fn create_dir_all(path: &Path) -> Result<()> {
    debug!("Creating directory recursively: {}", path.display());
    fs::create_dir_all(path).map_err(|e| {
        error!("Failed create dir {}: {}", path.display(), e);
        CasupError::from(e)
    })
}

/// Opens a file for appending, creating it (and its parent directory) if needed.
/// Never truncates.
pub fn open_append(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent)?;
        }
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            error!("Failed open {} for append: {}", path.display(), e);
            CasupError::from(e)
        })
}

/// Reads the entire contents of a file into a string.
pub fn read_to_string(path: &Path) -> Result<String> {
    debug!("Reading file to string: {}", path.display());
    fs::read_to_string(path).map_err(|e| {
        error!("Failed read file {}: {}", path.display(), e);
        CasupError::from(e)
    })
}

/// Creates an empty named temp file inside `dir`. Removed when dropped.
pub fn scratch_file(dir: &Path, prefix: &str) -> Result<NamedTempFile> {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempfile_in(dir)
        .map_err(CasupError::from)
}

/// Creates a fresh temp directory inside `dir`. Removed when dropped.
pub fn scratch_dir(dir: &Path, prefix: &str) -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir_in(dir)
        .map_err(CasupError::from)
}

/// Places `source` inside `dir` under its own file name. Hard links when
/// possible and falls back to copying (e.g. across filesystems).
pub fn stage_file_into(source: &Path, dir: &Path) -> Result<PathBuf> {
    let file_name = source.file_name().ok_or_else(|| {
        CasupError::ValidationError(format!("{} has no file name", source.display()))
    })?;
    let target = dir.join(file_name);

    match fs::hard_link(source, &target) {
        Ok(()) => {
            debug!("Linked {} -> {}", source.display(), target.display());
        }
        Err(e) => {
            debug!(
                "Hard link of {} failed ({}), copying instead",
                source.display(),
                e
            );
            fs::copy(source, &target).map_err(|e| {
                error!(
                    "Failed copy {} -> {}: {}",
                    source.display(),
                    target.display(),
                    e
                );
                CasupError::from(e)
            })?;
        }
    }
    Ok(target)
}

/// Atomically writes data to a file using a temporary file in the same directory.
pub fn atomic_write_file(original_path: &Path, content: &[u8]) -> Result<()> {
    let dir = original_path.parent().ok_or_else(|| {
        CasupError::Generic(format!(
            "Cannot get parent directory for {}",
            original_path.display()
        ))
    })?;

    create_dir_all(dir)?;

    let mut temp_file = NamedTempFile::new_in(dir)?;
    let temp_path = temp_file.path().to_path_buf();

    debug!(
        "Atomically writing {} bytes to {} via temp file {}",
        content.len(),
        original_path.display(),
        temp_path.display()
    );

    temp_file.write_all(content)?;
    temp_file.flush()?;
    if let Err(e) = temp_file.as_file().sync_all() {
        warn!("Failed to sync {}: {}", temp_path.display(), e);
    }

    temp_file.persist(original_path).map_err(|e| {
        error!(
            "Failed to persist temporary file {} over {}: {}",
            temp_path.display(),
            original_path.display(),
            e.error
        );
        CasupError::Io(Arc::new(e.error))
    })?;

    Ok(())
}
