//! The view engine: filter, search, then sort.
//!
//! `compute_view` is a pure function of its inputs. It builds one lazy query
//! over a clone of the dataset's frame, tagging each row with its position so
//! callers can tell which source rows survived.

use polars::prelude::*;
use tracing::debug;

use crate::categorical::FilterSelection;
use crate::dataset::{ColumnKind, Dataset};
use crate::error::Result;
use crate::sort_state::SortState;

const ROW_ID: &str = "__tallview_row_id";

/// A selection applied to one categorical column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoricalFilter {
    pub column: String,
    pub selection: FilterSelection,
}

impl CategoricalFilter {
    pub fn new(column: impl Into<String>, selection: FilterSelection) -> Self {
        Self {
            column: column.into(),
            selection,
        }
    }
}

/// Case-insensitive substring match of `needle` against the text of `column`.
/// Missing cells never match.
fn contains_ci(column: &str, needle: &str) -> Expr {
    col(column)
        .cast(DataType::String)
        .str()
        .to_lowercase()
        .str()
        .contains_literal(lit(needle.to_lowercase()))
        .fill_null(lit(false))
}

fn and_all(exprs: impl IntoIterator<Item = Expr>) -> Option<Expr> {
    exprs.into_iter().reduce(|acc, e| acc.and(e))
}

fn or_any(exprs: impl IntoIterator<Item = Expr>) -> Option<Expr> {
    exprs.into_iter().reduce(|acc, e| acc.or(e))
}

/// Rows of `dataset` matching every non-sentinel filter and the search term,
/// ordered by the active sort column if there is one.
///
/// Filters and sort columns the dataset does not have are skipped.
pub fn compute_view(
    dataset: &Dataset,
    filters: &[CategoricalFilter],
    search: &str,
    sort: &SortState,
) -> Result<View> {
    let mut lf = dataset.frame().clone().lazy().with_row_index(ROW_ID, None);

    let filter_exprs = filters.iter().filter_map(|filter| match &filter.selection {
        FilterSelection::All => None,
        FilterSelection::Token(_) if !dataset.has_column(&filter.column) => {
            debug!(column = %filter.column, "filter column not in dataset, ignored");
            None
        }
        FilterSelection::Token(token) => Some(contains_ci(&filter.column, token)),
    });
    if let Some(predicate) = and_all(filter_exprs) {
        lf = lf.filter(predicate);
    }

    if !search.is_empty() {
        let matches = dataset
            .columns()
            .iter()
            .map(|c| contains_ci(&c.name, search));
        if let Some(predicate) = or_any(matches) {
            lf = lf.filter(predicate);
        }
    }

    if let Some((column, direction)) = sort.active() {
        if let Some(spec) = dataset.column(column) {
            let key = match spec.kind {
                ColumnKind::Numeric => col(column).cast(DataType::Float64),
                ColumnKind::Text => col(column).cast(DataType::String),
            };
            let options = SortMultipleOptions {
                descending: vec![direction.is_descending()],
                nulls_last: vec![true],
                maintain_order: true,
                ..Default::default()
            };
            lf = lf.sort_by_exprs(vec![key], options);
        } else {
            debug!(column, "sort column not in dataset, keeping order");
        }
    }

    let df = lf.collect()?;
    let ids = df
        .column(ROW_ID)?
        .as_materialized_series()
        .cast(&DataType::UInt64)?;
    let row_ids = ids
        .u64()?
        .into_no_null_iter()
        .map(|id| id as usize)
        .collect::<Vec<_>>();
    let frame = df.drop(ROW_ID)?;

    debug!(
        rows = row_ids.len(),
        of = dataset.height(),
        search,
        "view recomputed"
    );
    Ok(View { frame, row_ids })
}

/// Ordered rows currently on screen.
#[derive(Debug, Clone)]
pub struct View {
    frame: DataFrame,
    row_ids: Vec<usize>,
}

fn cell_text(value: AnyValue) -> String {
    match value {
        AnyValue::Null => String::new(),
        v => v.str_value().to_string(),
    }
}

impl View {
    pub fn len(&self) -> usize {
        self.row_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_ids.is_empty()
    }

    /// Position of each view row in the source dataset.
    pub fn row_ids(&self) -> &[usize] {
        &self.row_ids
    }

    pub fn columns(&self) -> Vec<String> {
        self.frame
            .get_columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    pub fn row(&self, index: usize) -> Option<Vec<String>> {
        if index >= self.len() {
            return None;
        }
        Some(
            self.frame
                .get_columns()
                .iter()
                .map(|c| c.get(index).map(cell_text).unwrap_or_default())
                .collect(),
        )
    }

    pub fn rows(&self) -> Vec<Vec<String>> {
        (0..self.len()).filter_map(|i| self.row(i)).collect()
    }

    pub fn column_values(&self, name: &str) -> Option<Vec<String>> {
        let column = self.frame.column(name).ok()?;
        Some(
            (0..self.len())
                .map(|i| column.get(i).map(cell_text).unwrap_or_default())
                .collect(),
        )
    }
}
