use std::path::PathBuf;

use polars::prelude::PolarsError;
use thiserror::Error;

/// Failures surfaced by the viewer core.
///
/// Only load-time failures and "nothing loaded yet" reach the user. A filter or
/// sort that names a column the dataset does not have is a no-op, never an error.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("Dataset not found. Looked in: {}", display_candidates(.candidates))]
    SourceNotFound { candidates: Vec<PathBuf> },

    #[error("Could not read {}: {message}", .path.display())]
    LoadFailure { path: PathBuf, message: String },

    #[error("No dataset loaded")]
    NotLoaded,

    #[error("Could not compute view: {0}")]
    Engine(#[from] PolarsError),
}

fn display_candidates(candidates: &[PathBuf]) -> String {
    candidates
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ViewerError {
    /// True for failures that leave the session without a dataset.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            ViewerError::SourceNotFound { .. } | ViewerError::LoadFailure { .. }
        )
    }
}

pub type Result<T, E = ViewerError> = std::result::Result<T, E>;
