//! The loaded cut-off table.
//!
//! A [`Dataset`] is built once and never mutated; every view is derived from a
//! clone of its frame. Column kinds are fixed at load time from the dtypes
//! polars infers, so sorting knows whether to compare numbers or text.

use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::{debug, info};

use crate::error::{Result, ViewerError};
use crate::error_display::user_message_from_polars;

/// Legacy derived column present in the published CSV, never shown.
pub const DIGIT_COLUMN: &str = "Digit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Text,
}

impl ColumnKind {
    pub fn from_dtype(dtype: &DataType) -> Self {
        match dtype {
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64 => ColumnKind::Numeric,
            _ => ColumnKind::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
}

/// How to read the delimited source.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub delimiter: Option<u8>,
    pub infer_schema_length: Option<usize>,
    pub drop_columns: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            infer_schema_length: Some(1000),
            drop_columns: vec![DIGIT_COLUMN.to_string()],
        }
    }
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = Some(rows);
        self
    }

    pub fn with_drop_columns(mut self, columns: Vec<String>) -> Self {
        self.drop_columns = columns;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Dataset {
    df: DataFrame,
    columns: Vec<ColumnSpec>,
}

impl Dataset {
    /// Wrap an in-memory frame. Column order and kinds come from the frame.
    pub fn from_frame(df: DataFrame) -> Self {
        let columns = df
            .get_columns()
            .iter()
            .map(|c| ColumnSpec {
                name: c.name().to_string(),
                kind: ColumnKind::from_dtype(c.dtype()),
            })
            .collect();
        Self { df, columns }
    }

    /// Read a delimited file with a header row, dropping `options.drop_columns`
    /// when present.
    pub fn from_csv(path: &Path, options: &LoadOptions) -> Result<Self> {
        if !path.is_file() {
            return Err(ViewerError::SourceNotFound {
                candidates: vec![path.to_path_buf()],
            });
        }

        let load_failure = |e: PolarsError| ViewerError::LoadFailure {
            path: path.to_path_buf(),
            message: user_message_from_polars(&e),
        };

        let mut read_options = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(options.infer_schema_length);
        if let Some(delimiter) = options.delimiter {
            read_options = read_options.map_parse_options(|opts| opts.with_separator(delimiter));
        }

        let mut df = read_options
            .try_into_reader_with_file_path(Some(PathBuf::from(path)))
            .and_then(|reader| reader.finish())
            .map_err(load_failure)?;

        for name in &options.drop_columns {
            if df.get_column_index(name).is_some() {
                debug!(column = %name, "dropping column");
                df = df.drop(name).map_err(load_failure)?;
            }
        }

        let dataset = Self::from_frame(df);
        info!(
            path = %path.display(),
            rows = dataset.height(),
            columns = dataset.columns.len(),
            "dataset loaded"
        );
        Ok(dataset)
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.height() == 0
    }

    pub(crate) fn frame(&self) -> &DataFrame {
        &self.df
    }
}
