use crate::error::{MirrorError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Computes `target_root / (discovered_dir - source_root)`.
///
/// The difference is taken component-wise, so `/photos2` is not treated as
/// being inside `/photos`.
pub fn mirror_dir(source_root: &Path, target_root: &Path, discovered_dir: &Path) -> Result<PathBuf> {
    let relative = discovered_dir
        .strip_prefix(source_root)
        .map_err(|_| MirrorError::OutsideSourceRoot {
            path: discovered_dir.to_path_buf(),
            root: source_root.to_path_buf(),
        })?;
    Ok(target_root.join(relative))
}

/// Creates `dir` and any missing ancestors. An existing directory is not an error.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| MirrorError::filesystem(dir, e))
}

/// Maps a discovered source file to its mirrored target path and makes sure
/// the target directory exists.
///
/// # Arguments
/// * `source_root` - Root the file was discovered under
/// * `target_root` - Root of the mirrored tree
/// * `source_file` - Discovered file, at or below `source_root`
///
/// # Returns
/// * `Ok(target)` - `target_root` joined with the file's relative path
/// * `Err(MirrorError)` - If the file is outside `source_root` or the directory cannot be created
pub fn prepare_target(source_root: &Path, target_root: &Path, source_file: &Path) -> Result<PathBuf> {
    let file_name = source_file
        .file_name()
        .ok_or_else(|| MirrorError::OutsideSourceRoot {
            path: source_file.to_path_buf(),
            root: source_root.to_path_buf(),
        })?;
    let discovered_dir = source_file.parent().unwrap_or(source_root);

    let target_dir = mirror_dir(source_root, target_root, discovered_dir)?;
    ensure_dir(&target_dir)?;

    Ok(target_dir.join(file_name))
}
