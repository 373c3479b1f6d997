use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Row, StatefulWidget, Table, TableState, Widget},
};

use crate::sort_state::SortDirection;
use crate::view::View;

const MIN_COLUMN_WIDTH: usize = 6;
const MAX_COLUMN_WIDTH: usize = 32;

/// Scroll position and column cursor for the results table.
#[derive(Debug, Default)]
pub struct DataTableState {
    pub table_state: TableState,
    /// Column the sort key acts on
    pub selected_column: usize,
    pub visible_rows: usize,
}

impl DataTableState {
    pub fn new() -> Self {
        let mut table_state = TableState::default();
        table_state.select(Some(0));
        Self {
            table_state,
            selected_column: 0,
            visible_rows: 0,
        }
    }

    /// Called after every recomputation; the row count may have shrunk.
    pub fn clamp(&mut self, num_rows: usize, num_columns: usize) {
        let selected = self.table_state.selected().unwrap_or(0);
        self.table_state
            .select(Some(selected.min(num_rows.saturating_sub(1))));
        if num_rows == 0 {
            *self.table_state.offset_mut() = 0;
        }
        self.selected_column = self.selected_column.min(num_columns.saturating_sub(1));
    }

    pub fn select_next(&mut self, num_rows: usize) {
        self.scroll_by(1, num_rows);
    }

    pub fn select_previous(&mut self, num_rows: usize) {
        self.scroll_by(-1, num_rows);
    }

    pub fn page_down(&mut self, num_rows: usize) {
        self.scroll_by(self.visible_rows.max(1) as i64, num_rows);
    }

    pub fn page_up(&mut self, num_rows: usize) {
        self.scroll_by(-(self.visible_rows.max(1) as i64), num_rows);
    }

    fn scroll_by(&mut self, delta: i64, num_rows: usize) {
        if num_rows == 0 {
            return;
        }
        let current = self.table_state.selected().unwrap_or(0) as i64;
        let next = (current + delta).clamp(0, num_rows as i64 - 1);
        self.table_state.select(Some(next as usize));
    }

    pub fn scroll_to_start(&mut self) {
        self.table_state.select(Some(0));
    }

    pub fn scroll_to_end(&mut self, num_rows: usize) {
        self.table_state.select(Some(num_rows.saturating_sub(1)));
    }

    pub fn column_right(&mut self, num_columns: usize) {
        if self.selected_column + 1 < num_columns {
            self.selected_column += 1;
        }
    }

    pub fn column_left(&mut self) {
        self.selected_column = self.selected_column.saturating_sub(1);
    }
}

/// Renders a [`View`], marking the active sort column in the header.
pub struct DataTable<'a> {
    view: &'a View,
    sort: Option<(&'a str, SortDirection)>,
    header_color: Color,
    border_color: Color,
}

impl<'a> DataTable<'a> {
    pub fn new(view: &'a View) -> Self {
        Self {
            view,
            sort: None,
            header_color: Color::White,
            border_color: Color::Cyan,
        }
    }

    pub fn with_sort(mut self, sort: Option<(&'a str, SortDirection)>) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_colors(mut self, header: Color, border: Color) -> Self {
        self.header_color = header;
        self.border_color = border;
        self
    }

    fn header_label(&self, name: &str) -> String {
        match self.sort {
            Some((column, direction)) if column == name => {
                format!("{} {}", name, direction.indicator())
            }
            _ => name.to_string(),
        }
    }
}

impl StatefulWidget for DataTable<'_> {
    type State = DataTableState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        state.visible_rows = area.height.saturating_sub(1) as usize;

        if self.view.is_empty() {
            Paragraph::new("No rows match the current search and filters")
                .centered()
                .style(Style::default().fg(Color::DarkGray))
                .render(area, buf);
            return;
        }

        let columns = self.view.columns();
        let visible = state.visible_rows.max(1);
        let selected = state.table_state.selected().unwrap_or(0);
        let mut offset = state.table_state.offset();
        if selected < offset {
            offset = selected;
        } else if selected >= offset + visible {
            offset = selected + 1 - visible;
        }
        let last = (offset + visible).min(self.view.len());
        let rows: Vec<Vec<String>> = (offset..last).filter_map(|i| self.view.row(i)).collect();

        let widths: Vec<Constraint> = columns
            .iter()
            .enumerate()
            .map(|(c, name)| {
                let content = rows
                    .iter()
                    .map(|r| r.get(c).map(|v| v.chars().count()).unwrap_or(0))
                    .max()
                    .unwrap_or(0);
                let header = self.header_label(name).chars().count();
                Constraint::Length(
                    content
                        .max(header)
                        .clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH) as u16,
                )
            })
            .collect();

        let header_style = Style::default()
            .fg(self.header_color)
            .add_modifier(Modifier::BOLD);
        let header = Row::new(columns.iter().enumerate().map(|(c, name)| {
            let style = if c == state.selected_column {
                header_style.fg(self.border_color).add_modifier(Modifier::UNDERLINED)
            } else {
                header_style
            };
            Line::from(Span::styled(self.header_label(name), style))
        }));

        let table = Table::new(rows.into_iter().map(Row::new), widths)
            .header(header)
            .column_spacing(1)
            .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

        let mut window_state = TableState::default().with_selected(Some(selected - offset));
        StatefulWidget::render(table, area, buf, &mut window_state);
        *state.table_state.offset_mut() = offset;
    }
}
