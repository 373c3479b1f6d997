//! One viewing session: the loaded dataset plus everything the user has chosen.
//!
//! Every entry point recomputes the whole view and returns it. Nothing is
//! cached between calls except the filter options, which only change on load.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::categorical::{self, FilterOptions, FilterSelection};
use crate::config::FiltersConfig;
use crate::dataset::{Dataset, LoadOptions};
use crate::error::{Result, ViewerError};
use crate::sort_state::{SortDirection, SortState};
use crate::view::{compute_view, CategoricalFilter, View};

pub struct Session {
    dataset: Option<Dataset>,
    all_label: String,
    filters: Vec<CategoricalFilter>,
    options: HashMap<String, FilterOptions>,
    search: String,
    sort: SortState,
}

impl Session {
    /// `fields` are the categorical columns offered as filters, in display order.
    pub fn new<I, S>(fields: I, all_label: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dataset: None,
            all_label: all_label.into(),
            filters: fields
                .into_iter()
                .map(|f| CategoricalFilter::new(f, FilterSelection::All))
                .collect(),
            options: HashMap::new(),
            search: String::new(),
            sort: SortState::new(),
        }
    }

    pub fn from_config(config: &FiltersConfig) -> Self {
        Self::new(
            [config.institution_column.clone(), config.city_column.clone()],
            config.all_label.clone(),
        )
    }

    /// Read the dataset at `path`. On failure the session is left without a
    /// dataset.
    pub fn load(&mut self, path: &Path, options: &LoadOptions) -> Result<()> {
        match Dataset::from_csv(path, options) {
            Ok(dataset) => {
                self.load_dataset(dataset);
                Ok(())
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "load failed");
                self.dataset = None;
                self.options.clear();
                Err(e)
            }
        }
    }

    /// Install an already-built dataset, resetting selections, search and sort.
    pub fn load_dataset(&mut self, dataset: Dataset) {
        self.options = self
            .filters
            .iter()
            .map(|f| {
                (
                    f.column.clone(),
                    categorical::extract(&dataset, &f.column, &self.all_label),
                )
            })
            .collect();
        for filter in &mut self.filters {
            filter.selection = FilterSelection::All;
        }
        self.search.clear();
        self.sort.reset();
        info!(rows = dataset.height(), "session ready");
        self.dataset = Some(dataset);
    }

    pub fn is_loaded(&self) -> bool {
        self.dataset.is_some()
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn all_label(&self) -> &str {
        &self.all_label
    }

    /// Categorical columns in display order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.filters.iter().map(|f| f.column.as_str())
    }

    pub fn filter_options(&self, column: &str) -> Option<&FilterOptions> {
        self.options.get(column)
    }

    pub fn selection(&self, column: &str) -> Option<&FilterSelection> {
        self.filters
            .iter()
            .find(|f| f.column == column)
            .map(|f| &f.selection)
    }

    pub fn search_term(&self) -> &str {
        &self.search
    }

    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    pub fn set_search(&mut self, term: impl Into<String>) -> Result<View> {
        self.require_loaded()?;
        self.search = term.into();
        self.view()
    }

    /// Select a value for `column`. A column that is not one of the session's
    /// fields is added as an extra filter.
    pub fn select_filter(&mut self, column: &str, selection: FilterSelection) -> Result<View> {
        self.require_loaded()?;
        match self.filters.iter_mut().find(|f| f.column == column) {
            Some(filter) => filter.selection = selection,
            None => self.filters.push(CategoricalFilter::new(column, selection)),
        }
        self.view()
    }

    pub fn toggle_sort(&mut self, column: &str) -> Result<View> {
        self.require_loaded()?;
        let direction = self.sort.toggle(column);
        debug!(column, ?direction, "sort toggled");
        self.view()
    }

    /// Reset the search term and every filter to "all". Sort order is kept.
    pub fn clear(&mut self) -> Result<View> {
        self.require_loaded()?;
        self.search.clear();
        for filter in &mut self.filters {
            filter.selection = FilterSelection::All;
        }
        self.view()
    }

    pub fn view(&self) -> Result<View> {
        let dataset = self.require_loaded()?;
        compute_view(dataset, &self.filters, &self.search, &self.sort)
    }

    pub fn active_sort(&self) -> Option<(&str, SortDirection)> {
        self.sort.active()
    }

    fn require_loaded(&self) -> Result<&Dataset> {
        self.dataset.as_ref().ok_or(ViewerError::NotLoaded)
    }
}
