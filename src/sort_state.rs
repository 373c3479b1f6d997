use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn is_descending(self) -> bool {
        self == SortDirection::Descending
    }

    pub fn indicator(self) -> &'static str {
        match self {
            SortDirection::Ascending => "▲",
            SortDirection::Descending => "▼",
        }
    }
}

/// Per-column sort memory.
///
/// Each column remembers the direction it was last sorted in, so coming back
/// to a column after sorting by another one continues its own toggle sequence.
/// The most recently toggled column is the one that orders the view.
#[derive(Debug, Clone, Default)]
pub struct SortState {
    directions: HashMap<String, SortDirection>,
    active: Option<String>,
}

impl SortState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip `column`'s direction and make it the active sort column.
    /// A column never sorted before starts ascending.
    pub fn toggle(&mut self, column: &str) -> SortDirection {
        let previous = self
            .directions
            .get(column)
            .copied()
            .unwrap_or(SortDirection::Descending);
        let next = previous.flip();
        self.directions.insert(column.to_string(), next);
        self.active = Some(column.to_string());
        next
    }

    pub fn direction(&self, column: &str) -> Option<SortDirection> {
        self.directions.get(column).copied()
    }

    pub fn active(&self) -> Option<(&str, SortDirection)> {
        let column = self.active.as_deref()?;
        self.direction(column).map(|d| (column, d))
    }

    pub fn reset(&mut self) {
        self.directions.clear();
        self.active = None;
    }
}
