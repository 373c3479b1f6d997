use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Paragraph, Widget},
};

const CONTROLS: [(&str, &str); 6] = [
    ("Tab", "Focus"),
    ("←→", "Choose"),
    ("↑↓", "Scroll"),
    ("Enter", "Sort"),
    ("Esc", "Clear"),
    ("q", "Quit"),
];

/// Bottom bar: key hints followed by the visible/total row count.
#[derive(Default)]
pub struct Controls {
    /// `(visible, total)`
    pub row_count: Option<(usize, usize)>,
    pub dimmed: bool,
    pub bar_color: Option<Color>,
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_row_count(mut self, visible: usize, total: usize) -> Self {
        self.row_count = Some((visible, total));
        self
    }

    pub fn with_dimmed(mut self, dimmed: bool) -> Self {
        self.dimmed = dimmed;
        self
    }

    pub fn with_bar_color(mut self, color: Color) -> Self {
        self.bar_color = Some(color);
        self
    }

    fn row_count_text(&self) -> Option<String> {
        self.row_count
            .map(|(visible, total)| format!("Rows: {} / {}", visible, total))
    }
}

impl Widget for &Controls {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut constraints = CONTROLS.iter().fold(vec![], |mut acc, (key, action)| {
            acc.push(Constraint::Length(key.chars().count() as u16 + 2));
            acc.push(Constraint::Length(action.chars().count() as u16 + 1));
            acc
        });
        let count_text = self.row_count_text();
        constraints.push(Constraint::Fill(1));
        if let Some(text) = &count_text {
            constraints.push(Constraint::Length(text.chars().count() as u16 + 1));
        }

        let layout = Layout::new(Direction::Horizontal, constraints).split(area);
        let bar = self.bar_color.unwrap_or(Color::DarkGray);
        let base_style = if self.dimmed {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        for (i, (key, action)) in CONTROLS.iter().enumerate() {
            let j = i * 2;
            Paragraph::new(*key)
                .style(base_style.add_modifier(Modifier::BOLD))
                .centered()
                .render(layout[j], buf);
            Paragraph::new(*action)
                .style(base_style.bg(bar))
                .render(layout[j + 1], buf);
        }

        let fill_idx = CONTROLS.len() * 2;
        Paragraph::new("")
            .style(base_style.bg(bar))
            .render(layout[fill_idx], buf);
        if let Some(text) = count_text {
            Paragraph::new(text)
                .style(base_style.bg(bar).fg(if self.dimmed {
                    Color::DarkGray
                } else {
                    Color::White
                }))
                .right_aligned()
                .render(layout[fill_idx + 1], buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_count_rendered() {
        let controls = Controls::new().with_row_count(3, 10);
        let area = Rect::new(0, 0, 120, 1);
        let mut buf = Buffer::empty(area);
        (&controls).render(area, &mut buf);
        let line: String = (0..area.width)
            .map(|x| buf[(x, 0)].symbol().to_string())
            .collect();
        assert!(line.contains("Rows: 3 / 10"));
        assert!(line.contains("Quit"));
    }

    #[test]
    fn test_key_hints_are_bold() {
        let controls = Controls::new();
        let area = Rect::new(0, 0, 80, 1);
        let mut buf = Buffer::empty(area);
        (&controls).render(area, &mut buf);
        let key_cell = (0..area.width)
            .map(|x| &buf[(x, 0)])
            .find(|cell| cell.symbol() == "T")
            .unwrap();
        assert!(key_cell.modifier.contains(Modifier::BOLD));
    }
}
