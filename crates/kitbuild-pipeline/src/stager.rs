//! Filesystem staging: clean scratch copies and recursive copies.

use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::BuildError;
use crate::paths::ProjectPaths;

/// Remove a directory tree if it exists.
pub fn remove_dir_if_exists(path: &Path) -> Result<(), BuildError> {
    if path.exists() {
        fs::remove_dir_all(path).map_err(|e| BuildError::fs(path, e))?;
    }
    Ok(())
}

/// Create a directory (and parents) if missing.
pub fn ensure_dir(path: &Path) -> Result<(), BuildError> {
    fs::create_dir_all(path).map_err(|e| BuildError::fs(path, e))
}

/// Copy a single file, creating the destination's parent directory.
pub fn copy_file(from: &Path, to: &Path) -> Result<(), BuildError> {
    if let Some(parent) = to.parent() {
        ensure_dir(parent)?;
    }
    fs::copy(from, to).map_err(|e| BuildError::fs(from, e))?;
    Ok(())
}

/// Write a file, creating the parent directory.
pub fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents).map_err(|e| BuildError::fs(path, e))
}

/// Serialize `value` as two-space indented JSON and write it.
pub fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), BuildError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| BuildError::fs(path, e))?;
    write_file(path, json)
}

/// Recursively copy `src` into `dst`, merging with existing content.
pub fn copy_dir_all(src: &Path, dst: &Path) -> Result<usize, BuildError> {
    copy_dir_filtered(src, dst, |_| true)
}

/// Recursively copy the files of `src` accepted by `keep` into `dst`,
/// preserving relative directory structure. Returns the number of files copied.
pub fn copy_dir_filtered<F>(src: &Path, dst: &Path, keep: F) -> Result<usize, BuildError>
where
    F: Fn(&Path) -> bool,
{
    if !src.is_dir() {
        return Err(BuildError::fs(src, "not a directory"));
    }

    let mut copied = 0;

    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry.map_err(|e| BuildError::fs(src, e))?;
        let path = entry.path();
        let relative = path.strip_prefix(src).unwrap_or(path);
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            ensure_dir(&target)?;
        } else if keep(path) {
            copy_file(path, &target)?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// Replace the staged source tree and manifest with fresh copies.
///
/// A previously staged `src` is removed first so files deleted from the source
/// tree never linger in the build.
pub fn stage_sources(paths: &ProjectPaths) -> Result<(), BuildError> {
    let build_dir = paths.build_dir();
    ensure_dir(&build_dir)?;

    let staged_src = paths.staged_src_dir();
    remove_dir_if_exists(&staged_src)?;

    let count = copy_dir_all(&paths.src_dir(), &staged_src)?;
    copy_file(&paths.manifest(), &paths.staged_manifest())?;

    tracing::debug!("Staged {} source files into {}", count, staged_src.display());
    Ok(())
}

/// Start a one-shot build from an empty distribution directory.
pub fn initial_cleanup(paths: &ProjectPaths) -> Result<(), BuildError> {
    let dist = paths.dist_dir();
    remove_dir_if_exists(&dist)?;
    ensure_dir(&dist)
}
