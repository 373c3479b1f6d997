//! Locating the dataset file.
//!
//! An installed binary ships the CSV next to itself; a development checkout
//! keeps it in the working tree. Both layouts are searched.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, ViewerError};

pub const DEFAULT_DATASET_FILE: &str = "NotesDeTall.xlsx - Table 1.csv";

/// Pick the dataset path.
///
/// An explicit path (command line) wins, then a configured one; either must
/// exist. Otherwise `file_name` is searched for in [`search_dirs`].
pub fn resolve(
    explicit: Option<&Path>,
    configured: Option<&Path>,
    file_name: &str,
) -> Result<PathBuf> {
    if let Some(path) = explicit.or(configured) {
        return if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(ViewerError::SourceNotFound {
                candidates: vec![path.to_path_buf()],
            })
        };
    }
    resolve_in(&search_dirs(), file_name)
}

/// Executable directory first, then the working directory.
pub fn search_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        dirs.push(exe_dir);
    }
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.contains(&cwd) {
            dirs.push(cwd);
        }
    }
    dirs
}

/// First existing `<dir>/<file_name>` or `<dir>/data/<file_name>`.
pub fn resolve_in(dirs: &[PathBuf], file_name: &str) -> Result<PathBuf> {
    let candidates: Vec<PathBuf> = dirs
        .iter()
        .flat_map(|dir| [dir.join(file_name), dir.join("data").join(file_name)])
        .collect();

    match candidates.iter().find(|p| p.is_file()) {
        Some(found) => {
            debug!(path = %found.display(), "dataset resolved");
            Ok(found.clone())
        }
        None => Err(ViewerError::SourceNotFound { candidates }),
    }
}
