//! Filter options for multi-valued columns.
//!
//! A cell such as `"UB, UAB"` or `"UAB/UPC"` names several institutions at
//! once. Options are the distinct tokens across the whole column, with the
//! "all" sentinel first.

use std::collections::BTreeSet;

use polars::prelude::DataType;
use tracing::{debug, warn};

use crate::dataset::Dataset;

pub const DEFAULT_ALL_LABEL: &str = "Totes";

/// Split a cell on `,` and `/`, trimming pieces and dropping empty ones.
pub fn split_tokens(value: &str) -> impl Iterator<Item = &str> {
    value.split([',', '/']).map(str::trim).filter(|t| !t.is_empty())
}

/// Current choice for one categorical field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FilterSelection {
    #[default]
    All,
    Token(String),
}

impl FilterSelection {
    pub fn token(value: impl Into<String>) -> Self {
        FilterSelection::Token(value.into())
    }

    /// Map a label shown to the user back to a selection.
    pub fn from_label(label: &str, all_label: &str) -> Self {
        if label == all_label {
            FilterSelection::All
        } else {
            FilterSelection::Token(label.to_string())
        }
    }

    pub fn label<'a>(&'a self, all_label: &'a str) -> &'a str {
        match self {
            FilterSelection::All => all_label,
            FilterSelection::Token(t) => t,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, FilterSelection::All)
    }
}

/// Option list for one field: sentinel first, then tokens in ascending order.
/// Empty when the field's column is not in the dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    labels: Vec<String>,
}

impl FilterOptions {
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn tokens(&self) -> &[String] {
        self.labels.get(1..).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Index 0 is the sentinel.
    pub fn selection_at(&self, index: usize) -> Option<FilterSelection> {
        match index {
            0 if !self.labels.is_empty() => Some(FilterSelection::All),
            _ => self
                .labels
                .get(index)
                .map(|t| FilterSelection::Token(t.clone())),
        }
    }

    pub fn position(&self, selection: &FilterSelection) -> Option<usize> {
        match selection {
            FilterSelection::All if !self.labels.is_empty() => Some(0),
            FilterSelection::All => None,
            FilterSelection::Token(t) => self.tokens().iter().position(|x| x == t).map(|i| i + 1),
        }
    }
}

/// Collect the filter options for `column`.
pub fn extract(dataset: &Dataset, column: &str, all_label: &str) -> FilterOptions {
    let Ok(values) = dataset.frame().column(column) else {
        debug!(column, "categorical column not in dataset, no options");
        return FilterOptions::default();
    };
    let text = match values.as_materialized_series().cast(&DataType::String) {
        Ok(text) => text,
        Err(e) => {
            warn!(column, error = %e, "could not read categorical column as text");
            return FilterOptions::default();
        }
    };
    let Ok(cells) = text.str() else {
        return FilterOptions::default();
    };

    let mut tokens = BTreeSet::new();
    for cell in cells.into_iter().flatten() {
        tokens.extend(split_tokens(cell).map(str::to_string));
    }
    debug!(column, count = tokens.len(), "extracted filter options");

    let mut labels = Vec::with_capacity(tokens.len() + 1);
    labels.push(all_label.to_string());
    labels.extend(tokens);
    FilterOptions { labels }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn dataset(values: &[Option<&str>]) -> Dataset {
        let df = df!("Universitat" => values).unwrap();
        Dataset::from_frame(df)
    }

    #[test]
    fn test_split_tokens() {
        assert_eq!(split_tokens("UB, UAB").collect::<Vec<_>>(), vec!["UB", "UAB"]);
        assert_eq!(split_tokens("UAB/UPC").collect::<Vec<_>>(), vec!["UAB", "UPC"]);
        assert_eq!(split_tokens(" , / ").count(), 0);
        assert_eq!(split_tokens("").count(), 0);
    }

    #[test]
    fn test_split_is_idempotent() {
        for cell in ["UB, UAB", "UAB/UPC", " Girona /Lleida,, Vic ", "Sant Cugat del Vallès"] {
            for token in split_tokens(cell) {
                assert_eq!(split_tokens(token).collect::<Vec<_>>(), vec![token]);
            }
        }
    }

    #[test]
    fn test_extract_sorted_with_sentinel() {
        let ds = dataset(&[Some("UB, UAB"), Some("UAB/UPC"), Some("")]);
        let options = extract(&ds, "Universitat", DEFAULT_ALL_LABEL);
        assert_eq!(options.labels(), ["Totes", "UAB", "UB", "UPC"]);
        assert_eq!(options.tokens(), ["UAB", "UB", "UPC"]);
    }

    #[test]
    fn test_extract_skips_nulls() {
        let ds = dataset(&[None, Some("UdG"), None]);
        let options = extract(&ds, "Universitat", DEFAULT_ALL_LABEL);
        assert_eq!(options.labels(), ["Totes", "UdG"]);
    }

    #[test]
    fn test_extract_is_case_sensitive_ordering() {
        let ds = dataset(&[Some("b"), Some("B"), Some("a")]);
        let options = extract(&ds, "Universitat", DEFAULT_ALL_LABEL);
        assert_eq!(options.tokens(), ["B", "a", "b"]);
    }

    #[test]
    fn test_extract_missing_column_is_empty() {
        let ds = dataset(&[Some("UB")]);
        let options = extract(&ds, "Ciutat", DEFAULT_ALL_LABEL);
        assert!(options.is_empty());
        assert_eq!(options.selection_at(0), None);
    }

    #[test]
    fn test_extract_is_deterministic() {
        let ds = dataset(&[Some("UPC/UB"), Some("UAB, UB")]);
        assert_eq!(
            extract(&ds, "Universitat", DEFAULT_ALL_LABEL),
            extract(&ds, "Universitat", DEFAULT_ALL_LABEL)
        );
    }

    #[test]
    fn test_selection_round_trip_through_index() {
        let ds = dataset(&[Some("UB, UAB")]);
        let options = extract(&ds, "Universitat", DEFAULT_ALL_LABEL);
        assert_eq!(options.selection_at(0), Some(FilterSelection::All));
        assert_eq!(options.selection_at(2), Some(FilterSelection::token("UB")));
        assert_eq!(options.selection_at(3), None);
        assert_eq!(options.position(&FilterSelection::token("UB")), Some(2));
        assert_eq!(options.position(&FilterSelection::token("UPF")), None);
    }

    #[test]
    fn test_selection_labels() {
        assert_eq!(FilterSelection::from_label("Totes", "Totes"), FilterSelection::All);
        assert_eq!(
            FilterSelection::from_label("UB", "Totes"),
            FilterSelection::token("UB")
        );
        assert_eq!(FilterSelection::All.label("Totes"), "Totes");
    }
}
