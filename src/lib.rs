use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use tracing::{debug, error, info};

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, StatefulWidget, Wrap};
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

pub mod categorical;
pub mod config;
pub mod dataset;
pub mod error;
pub mod error_display;
pub mod resource;
pub mod session;
pub mod sort_state;
pub mod view;
pub mod widgets;

pub use categorical::{FilterOptions, FilterSelection};
pub use config::{rgb_to_256_color, AppConfig, ColorParser, ConfigManager, Theme};
pub use dataset::{Dataset, LoadOptions};
pub use error::ViewerError;
pub use session::Session;
pub use sort_state::{SortDirection, SortState};
pub use tallview_cli::Args;
pub use view::View;

use config::DatasetConfig;
use widgets::controls::Controls;
use widgets::datatable::{DataTable, DataTableState};
use widgets::filter_bar::{BarFocus, FilterBar, Selector};

/// Application name used for the config directory and other app-specific paths
pub const APP_NAME: &str = "tallview";

impl LoadOptions {
    /// Command-line values take precedence over the config file.
    pub fn from_args_and_config(args: &Args, config: &DatasetConfig) -> Self {
        let mut opts = LoadOptions::new().with_drop_columns(config.drop_columns.clone());
        if let Some(delimiter) = args.delimiter.or(config.delimiter) {
            opts = opts.with_delimiter(delimiter);
        }
        if let Some(rows) = args.infer_schema_length.or(config.infer_schema_length) {
            opts = opts.with_infer_schema_length(rows);
        }
        opts
    }
}

#[derive(Debug, Clone)]
pub enum AppEvent {
    Key(KeyEvent),
    Open(PathBuf, LoadOptions),
    DoLoad(PathBuf, LoadOptions), // Performs the load after the "Loading" frame is drawn
    Search(String),
    SelectFilter(String, FilterSelection),
    ToggleSort(String),
    Clear,
    Exit,
    Resize(u16, u16),
}

/// Keyboard focus. Tab cycles Search → each filter → Table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Search,
    Filter(usize),
    Table,
}

impl Focus {
    fn next(self, num_filters: usize) -> Self {
        match self {
            Focus::Search if num_filters > 0 => Focus::Filter(0),
            Focus::Search => Focus::Table,
            Focus::Filter(i) if i + 1 < num_filters => Focus::Filter(i + 1),
            Focus::Filter(_) => Focus::Table,
            Focus::Table => Focus::Search,
        }
    }

    fn previous(self, num_filters: usize) -> Self {
        match self {
            Focus::Search => Focus::Table,
            Focus::Filter(0) => Focus::Search,
            Focus::Filter(i) => Focus::Filter(i - 1),
            Focus::Table if num_filters > 0 => Focus::Filter(num_filters - 1),
            Focus::Table => Focus::Search,
        }
    }
}

#[derive(Debug, Default)]
pub struct ErrorModal {
    pub active: bool,
    pub message: String,
}

impl ErrorModal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, message: String) {
        self.active = true;
        self.message = message;
    }

    pub fn hide(&mut self) {
        self.active = false;
        self.message.clear();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadingState {
    #[default]
    Idle,
    Loading(PathBuf),
    /// The load failed; every control except quit is inert.
    Failed,
}

pub struct App {
    events: Sender<AppEvent>,
    session: Session,
    fields: Vec<String>,
    view: Option<View>,
    focus: Focus,
    /// Typed text; kept here so keystrokes queued ahead of their Search events compose.
    search_input: String,
    table_state: DataTableState,
    error_modal: ErrorModal,
    loading_state: LoadingState,
    theme: Theme,
}

impl App {
    pub fn new(events: Sender<AppEvent>) -> App {
        Self::from_parts(events, &AppConfig::default(), Theme::default())
    }

    pub fn new_with_config(events: Sender<AppEvent>, app_config: &AppConfig) -> Result<App> {
        let theme = Theme::from_config(&app_config.theme)?;
        Ok(Self::from_parts(events, app_config, theme))
    }

    fn from_parts(events: Sender<AppEvent>, app_config: &AppConfig, theme: Theme) -> App {
        let session = Session::from_config(&app_config.filters);
        let fields = session.fields().map(str::to_string).collect();
        App {
            events,
            session,
            fields,
            view: None,
            focus: Focus::default(),
            search_input: String::new(),
            table_state: DataTableState::new(),
            error_modal: ErrorModal::new(),
            loading_state: LoadingState::Idle,
            theme,
        }
    }

    pub fn send_event(&mut self, event: AppEvent) -> Result<()> {
        self.events.send(event)?;
        Ok(())
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn view(&self) -> Option<&View> {
        self.view.as_ref()
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn error_modal(&self) -> &ErrorModal {
        &self.error_modal
    }

    pub fn loading_state(&self) -> &LoadingState {
        &self.loading_state
    }

    pub fn selected_column(&self) -> usize {
        self.table_state.selected_column
    }

    fn color(&self, name: &str) -> ratatui::style::Color {
        self.theme.get(name)
    }

    fn column_names(&self) -> Vec<String> {
        self.view.as_ref().map(View::columns).unwrap_or_default()
    }

    /// Install a freshly computed view, or surface the failure.
    fn apply(&mut self, result: error::Result<View>) {
        match result {
            Ok(view) => {
                debug!(rows = view.len(), "view updated");
                self.table_state.clamp(view.len(), view.columns().len());
                self.view = Some(view);
            }
            Err(e) => {
                error!("view computation failed: {}", e);
                self.error_modal.show(e.to_string());
            }
        }
    }

    fn load(&mut self, path: &Path, options: &LoadOptions) {
        match self.session.load(path, options) {
            Ok(()) => {
                info!(path = %path.display(), "dataset ready");
                self.loading_state = LoadingState::Idle;
                self.search_input.clear();
                self.table_state = DataTableState::new();
                let view = self.session.view();
                self.apply(view);
            }
            Err(e) => self.fail_load(&e),
        }
    }

    /// Show a load failure. Only quitting is possible afterwards.
    pub fn fail_load(&mut self, err: &ViewerError) {
        error!("load failed: {}", err);
        self.loading_state = LoadingState::Failed;
        self.view = None;
        self.error_modal.show(err.to_string());
    }

    /// Next or previous option for the filter at `index`, wrapping around.
    fn cycle_filter(&self, index: usize, forward: bool) -> Option<AppEvent> {
        let field = self.fields.get(index)?;
        let options = self.session.filter_options(field)?;
        if options.is_empty() {
            return None;
        }
        let current = self
            .session
            .selection(field)
            .and_then(|s| options.position(s))
            .unwrap_or(0);
        let next = if forward {
            (current + 1) % options.len()
        } else {
            (current + options.len() - 1) % options.len()
        };
        let selection = options.selection_at(next)?;
        Some(AppEvent::SelectFilter(field.clone(), selection))
    }

    fn sort_column_at(&self, index: usize) -> Option<AppEvent> {
        self.column_names()
            .into_iter()
            .nth(index)
            .map(AppEvent::ToggleSort)
    }

    fn key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        if event.code == KeyCode::Char('c') && event.modifiers.contains(KeyModifiers::CONTROL) {
            return Some(AppEvent::Exit);
        }

        if self.loading_state == LoadingState::Failed {
            return match event.code {
                KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter => Some(AppEvent::Exit),
                _ => None,
            };
        }

        if self.error_modal.active {
            if matches!(event.code, KeyCode::Esc | KeyCode::Enter) {
                self.error_modal.hide();
            }
            return None;
        }

        if !self.session.is_loaded() {
            return match event.code {
                KeyCode::Char('q') => Some(AppEvent::Exit),
                _ => None,
            };
        }

        match event.code {
            KeyCode::Tab => {
                self.focus = self.focus.next(self.fields.len());
                return None;
            }
            KeyCode::BackTab => {
                self.focus = self.focus.previous(self.fields.len());
                return None;
            }
            KeyCode::Esc => {
                self.search_input.clear();
                return Some(AppEvent::Clear);
            }
            _ => {}
        }

        match self.focus {
            Focus::Search => match event.code {
                KeyCode::Char(c) if !event.modifiers.contains(KeyModifiers::CONTROL) => {
                    self.search_input.push(c);
                    Some(AppEvent::Search(self.search_input.clone()))
                }
                KeyCode::Backspace => {
                    self.search_input.pop()?;
                    Some(AppEvent::Search(self.search_input.clone()))
                }
                KeyCode::Enter | KeyCode::Down => {
                    self.focus = Focus::Table;
                    None
                }
                _ => None,
            },
            Focus::Filter(i) => match event.code {
                KeyCode::Right | KeyCode::Char('l') => self.cycle_filter(i, true),
                KeyCode::Left | KeyCode::Char('h') => self.cycle_filter(i, false),
                KeyCode::Home => self
                    .fields
                    .get(i)
                    .map(|f| AppEvent::SelectFilter(f.clone(), FilterSelection::All)),
                KeyCode::Enter | KeyCode::Down => {
                    self.focus = Focus::Table;
                    None
                }
                KeyCode::Char('/') => {
                    self.focus = Focus::Search;
                    None
                }
                KeyCode::Char('q') => Some(AppEvent::Exit),
                _ => None,
            },
            Focus::Table => {
                let num_rows = self.view.as_ref().map(View::len).unwrap_or(0);
                let num_columns = self.column_names().len();
                match event.code {
                    KeyCode::Down | KeyCode::Char('j') => self.table_state.select_next(num_rows),
                    KeyCode::Up | KeyCode::Char('k') => self.table_state.select_previous(num_rows),
                    KeyCode::PageDown => self.table_state.page_down(num_rows),
                    KeyCode::PageUp => self.table_state.page_up(num_rows),
                    KeyCode::Home => self.table_state.scroll_to_start(),
                    KeyCode::End => self.table_state.scroll_to_end(num_rows),
                    KeyCode::Right | KeyCode::Char('l') => {
                        self.table_state.column_right(num_columns)
                    }
                    KeyCode::Left | KeyCode::Char('h') => self.table_state.column_left(),
                    KeyCode::Enter | KeyCode::Char('s') => {
                        return self.sort_column_at(self.table_state.selected_column);
                    }
                    KeyCode::Char(c @ '1'..='9') => {
                        let index = c as usize - '1' as usize;
                        if index < num_columns {
                            self.table_state.selected_column = index;
                        }
                        return self.sort_column_at(index);
                    }
                    KeyCode::Char('/') => self.focus = Focus::Search,
                    KeyCode::Char('q') => return Some(AppEvent::Exit),
                    _ => {}
                }
                None
            }
        }
    }

    pub fn event(&mut self, event: &AppEvent) -> Option<AppEvent> {
        match event {
            AppEvent::Key(key) => self.key(key),
            AppEvent::Open(path, options) => {
                self.loading_state = LoadingState::Loading(path.clone());
                Some(AppEvent::DoLoad(path.clone(), options.clone()))
            }
            AppEvent::DoLoad(path, options) => {
                self.load(path, options);
                None
            }
            AppEvent::Search(term) => {
                let result = self.session.set_search(term.as_str());
                self.apply(result);
                None
            }
            AppEvent::SelectFilter(field, selection) => {
                let result = self.session.select_filter(field, selection.clone());
                self.apply(result);
                None
            }
            AppEvent::ToggleSort(column) => {
                let result = self.session.toggle_sort(column);
                self.apply(result);
                None
            }
            AppEvent::Clear => {
                self.search_input.clear();
                let result = self.session.clear();
                self.apply(result);
                None
            }
            AppEvent::Resize(_, _) | AppEvent::Exit => None,
        }
    }

    fn selectors(&self) -> Vec<Selector<'_>> {
        let all_label = self.session.all_label();
        self.fields
            .iter()
            .map(|field| {
                let options = self.session.filter_options(field);
                let selection = self.session.selection(field);
                let position = match (options, selection) {
                    (Some(o), Some(s)) => o.position(s).unwrap_or(0),
                    _ => 0,
                };
                Selector {
                    field,
                    label: selection.map(|s| s.label(all_label)).unwrap_or(all_label),
                    position,
                    count: options.map(FilterOptions::len).unwrap_or(0),
                }
            })
            .collect()
    }

    fn render_error_modal(&self, area: Rect, buf: &mut Buffer) {
        let popup_area = centered_rect(area, 70, 40);
        Clear.render(popup_area, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Error")
            .border_style(Style::default().fg(self.color("error")));
        let hint = if self.loading_state == LoadingState::Failed {
            "Press q or Esc to quit"
        } else {
            "Press Esc or Enter to close"
        };
        let text = format!("{}\n\n{}", self.error_modal.message, hint);
        Paragraph::new(text)
            .wrap(Wrap { trim: true })
            .block(block)
            .render(popup_area, buf);
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Fill(1),
                Constraint::Length(1),
            ])
            .split(area);

        let inert = self.loading_state == LoadingState::Failed || self.error_modal.active;
        let bar_focus = match self.focus {
            Focus::Search => Some(BarFocus::Search),
            Focus::Filter(i) => Some(BarFocus::Selector(i)),
            Focus::Table => None,
        };
        FilterBar::new(&self.search_input, self.selectors())
            .with_focus(bar_focus)
            .with_colors(self.color("selector_active"), self.color("table_border"))
            .with_dimmed(inert)
            .render(layout[0], buf);

        let border_style = if self.focus == Focus::Table && !inert {
            Style::default()
                .fg(self.color("table_border"))
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.color("dimmed"))
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style);
        let table_area = block.inner(layout[1]);
        block.render(layout[1], buf);

        match (&self.loading_state, &self.view) {
            (LoadingState::Loading(path), _) => {
                Paragraph::new(format!("Loading {}", path.display()))
                    .centered()
                    .render(table_area, buf);
            }
            (_, Some(view)) => {
                let table = DataTable::new(view)
                    .with_sort(self.session.active_sort())
                    .with_colors(self.color("table_header"), self.color("primary"));
                StatefulWidget::render(table, table_area, buf, &mut self.table_state);
            }
            _ => {}
        }

        let total = self.session.dataset().map(Dataset::height).unwrap_or(0);
        let visible = self.view.as_ref().map(View::len).unwrap_or(0);
        let mut controls = Controls::new()
            .with_dimmed(inert)
            .with_bar_color(self.color("dimmed"));
        if self.session.is_loaded() {
            controls = controls.with_row_count(visible, total);
        }
        (&controls).render(layout[2], buf);

        if self.error_modal.active {
            self.render_error_modal(area, buf);
        }
    }
}

/// Centered sub-rectangle taking the given percentages of `r`.
fn centered_rect(r: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;
    use std::sync::mpsc::channel;

    fn press(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    /// Feed an event and everything it triggers, like the main loop does.
    fn drive(app: &mut App, event: AppEvent) {
        let mut next = Some(event);
        while let Some(event) = next {
            next = app.event(&event);
        }
    }

    fn loaded_app() -> App {
        let (tx, _rx) = channel();
        let mut app = App::new(tx);
        let df = df!(
            "Universitat" => &["UAB", "UB / UPC", "UPC"],
            "Ciutat" => &["Bellaterra", "Barcelona", "Terrassa"],
            "Nota" => &[12.5, 9.0, 7.25],
        )
        .unwrap();
        app.session.load_dataset(Dataset::from_frame(df));
        let view = app.session.view();
        app.apply(view);
        app
    }

    #[test]
    fn test_focus_cycle() {
        assert_eq!(Focus::Search.next(2), Focus::Filter(0));
        assert_eq!(Focus::Filter(1).next(2), Focus::Table);
        assert_eq!(Focus::Table.next(2), Focus::Search);
        assert_eq!(Focus::Search.previous(2), Focus::Table);
        assert_eq!(Focus::Table.previous(2), Focus::Filter(1));
        assert_eq!(Focus::Search.next(0), Focus::Table);
    }

    #[test]
    fn test_resize_and_exit_produce_no_followup() {
        let mut app = loaded_app();
        assert!(app.event(&AppEvent::Resize(80, 24)).is_none());
        assert!(app.event(&AppEvent::Exit).is_none());
        assert_eq!(app.view().map(View::len), Some(3));
    }

    #[test]
    fn test_typing_searches() {
        let mut app = loaded_app();
        drive(&mut app, press(KeyCode::Char('s')));
        drive(&mut app, press(KeyCode::Char('s')));
        assert_eq!(app.session().search_term(), "ss");
        assert_eq!(app.view().map(View::row_ids), Some(&[2usize][..]));

        drive(&mut app, press(KeyCode::Backspace));
        drive(&mut app, press(KeyCode::Backspace));
        assert_eq!(app.view().map(View::len), Some(3));
    }

    #[test]
    fn test_filter_cycles_through_options() {
        let mut app = loaded_app();
        drive(&mut app, press(KeyCode::Tab));
        assert_eq!(app.focus(), Focus::Filter(0));

        drive(&mut app, press(KeyCode::Right));
        assert_eq!(
            app.session().selection("Universitat"),
            Some(&FilterSelection::token("UAB"))
        );
        assert_eq!(app.view().map(View::row_ids), Some(&[0usize][..]));

        drive(&mut app, press(KeyCode::Left));
        drive(&mut app, press(KeyCode::Left));
        assert_eq!(
            app.session().selection("Universitat"),
            Some(&FilterSelection::token("UPC"))
        );
        assert_eq!(app.view().map(View::row_ids), Some(&[1usize, 2][..]));
    }

    #[test]
    fn test_sort_key_toggles_selected_column() {
        let mut app = loaded_app();
        app.focus = Focus::Table;
        drive(&mut app, press(KeyCode::Char('3')));
        assert_eq!(app.selected_column(), 2);
        assert_eq!(
            app.session().active_sort(),
            Some(("Nota", SortDirection::Ascending))
        );
        assert_eq!(app.view().map(View::row_ids), Some(&[2usize, 1, 0][..]));

        drive(&mut app, press(KeyCode::Enter));
        assert_eq!(
            app.session().active_sort(),
            Some(("Nota", SortDirection::Descending))
        );
    }

    #[test]
    fn test_escape_clears_search_and_filters() {
        let mut app = loaded_app();
        drive(&mut app, press(KeyCode::Char('x')));
        assert_eq!(app.view().map(View::len), Some(0));
        drive(&mut app, press(KeyCode::Esc));
        assert_eq!(app.session().search_term(), "");
        assert_eq!(app.view().map(View::len), Some(3));
    }

    #[test]
    fn test_failed_load_makes_controls_inert() {
        let (tx, _rx) = channel();
        let mut app = App::new(tx);
        drive(
            &mut app,
            AppEvent::Open(PathBuf::from("/no/such/file.csv"), LoadOptions::new()),
        );
        assert_eq!(app.loading_state(), &LoadingState::Failed);
        assert!(app.error_modal().active);
        assert!(app.error_modal().message.contains("not found"));

        assert!(app.event(&press(KeyCode::Char('a'))).is_none());
        assert!(app.event(&press(KeyCode::Tab)).is_none());
        assert_eq!(app.focus(), Focus::Search);
        assert!(matches!(
            app.event(&press(KeyCode::Char('q'))),
            Some(AppEvent::Exit)
        ));
    }

    #[test]
    fn test_load_options_prefer_command_line() {
        let args = Args {
            path: None,
            delimiter: Some(b';'),
            infer_schema_length: None,
            debug: false,
            generate_config: false,
            force: false,
        };
        let config = DatasetConfig {
            delimiter: Some(b'\t'),
            infer_schema_length: Some(50),
            ..DatasetConfig::default()
        };
        let opts = LoadOptions::from_args_and_config(&args, &config);
        assert_eq!(opts.delimiter, Some(b';'));
        assert_eq!(opts.infer_schema_length, Some(50));
        assert_eq!(opts.drop_columns, vec!["Digit".to_string()]);
    }

    #[test]
    fn test_render_shows_rows_and_sort_indicator() {
        let mut app = loaded_app();
        drive(&mut app, AppEvent::ToggleSort("Nota".to_string()));
        let area = Rect::new(0, 0, 100, 12);
        let mut buf = Buffer::empty(area);
        (&mut app).render(area, &mut buf);
        let text: String = (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n");
        assert!(text.contains("Nota ▲"));
        assert!(text.contains("Terrassa"));
        assert!(text.contains("Rows: 3 / 3"));
    }
}
