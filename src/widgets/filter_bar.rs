use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

pub const TITLE: &str = " Cercador de Notes de Tall ";
pub const SEARCH_LABEL: &str = "Buscar: ";

/// One categorical filter as shown in the bar.
#[derive(Debug, Clone)]
pub struct Selector<'a> {
    pub field: &'a str,
    pub label: &'a str,
    /// Index of `label` in the option list, and the list length
    pub position: usize,
    pub count: usize,
}

/// Which element of the bar has keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarFocus {
    Search,
    Selector(usize),
}

pub struct FilterBar<'a> {
    search: &'a str,
    selectors: Vec<Selector<'a>>,
    focus: Option<BarFocus>,
    active_color: Color,
    border_color: Color,
    dimmed: bool,
}

impl<'a> FilterBar<'a> {
    pub fn new(search: &'a str, selectors: Vec<Selector<'a>>) -> Self {
        Self {
            search,
            selectors,
            focus: None,
            active_color: Color::Yellow,
            border_color: Color::Cyan,
            dimmed: false,
        }
    }

    pub fn with_focus(mut self, focus: Option<BarFocus>) -> Self {
        self.focus = focus;
        self
    }

    pub fn with_colors(mut self, active: Color, border: Color) -> Self {
        self.active_color = active;
        self.border_color = border;
        self
    }

    pub fn with_dimmed(mut self, dimmed: bool) -> Self {
        self.dimmed = dimmed;
        self
    }

    fn element_style(&self, focus: BarFocus) -> Style {
        if self.dimmed {
            Style::default().fg(Color::DarkGray)
        } else if self.focus == Some(focus) {
            Style::default()
                .fg(self.active_color)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        }
    }

    fn line(&self) -> Line<'a> {
        let mut spans = vec![
            Span::styled(SEARCH_LABEL, Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(
                format!("[{}]", self.search),
                self.element_style(BarFocus::Search),
            ),
        ];
        if self.focus == Some(BarFocus::Search) && !self.dimmed {
            spans.push(Span::styled("▏", Style::default().fg(self.active_color)));
        }

        for (i, selector) in self.selectors.iter().enumerate() {
            spans.push(Span::raw("   "));
            spans.push(Span::styled(
                format!("{}: ", selector.field),
                Style::default().add_modifier(Modifier::BOLD),
            ));
            let style = self.element_style(BarFocus::Selector(i));
            if selector.count == 0 {
                spans.push(Span::styled("-", style));
                continue;
            }
            spans.push(Span::styled(format!("◀ {} ▶", selector.label), style));
            spans.push(Span::styled(
                format!(" {}/{}", selector.position + 1, selector.count),
                Style::default().fg(Color::DarkGray),
            ));
        }
        Line::from(spans)
    }
}

impl Widget for FilterBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(TITLE)
            .border_style(Style::default().fg(self.border_color));
        Paragraph::new(self.line()).block(block).render(area, buf);
    }
}
