use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::common::{dim_style, palette, status_color};

/// Builder for the single-line status bar under the product list.
///
/// Layout: `[Label] [Status?] Position | More? | Help Text`
pub struct StatusBar<'a> {
    label: &'a str,
    status: Option<(&'a str, bool)>,
    position: Option<(usize, usize)>,
    end_of_feed: bool,
    help_text: &'a str,
}

impl Default for StatusBar<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> StatusBar<'a> {
    pub fn new() -> Self {
        Self {
            label: "",
            status: None,
            position: None,
            end_of_feed: false,
            help_text: "",
        }
    }

    pub fn label(mut self, label: &'a str) -> Self {
        self.label = label;
        self
    }

    pub fn loading(mut self, text: &'a str) -> Self {
        self.status = Some((text, false));
        self
    }

    pub fn error(mut self, text: &'a str) -> Self {
        self.status = Some((text, true));
        self
    }

    pub fn position(mut self, current: usize, total: usize) -> Self {
        self.position = Some((current, total));
        self
    }

    pub fn end_of_feed(mut self, end: bool) -> Self {
        self.end_of_feed = end;
        self
    }

    pub fn help(mut self, text: &'a str) -> Self {
        self.help_text = text;
        self
    }

    pub fn render(self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![
            Span::styled(
                format!(" {} ", self.label),
                Style::default()
                    .bg(palette::STATUS_BAR_BG)
                    .fg(palette::STATUS_BAR_FG),
            ),
            Span::raw(" "),
        ];

        if let Some((text, is_error)) = self.status {
            spans.push(Span::styled(
                text.to_string(),
                Style::default().fg(status_color(is_error)),
            ));
            spans.push(Span::raw(" | "));
        }

        if let Some((current, total)) = self.position {
            let total = if self.end_of_feed {
                total.to_string()
            } else {
                format!("{total}+")
            };
            spans.push(Span::styled(format!("{current}/{total}"), dim_style()));
            spans.push(Span::raw(" | "));
        }

        spans.push(Span::styled(self.help_text.to_string(), dim_style()));

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::tests::render_to_string;

    #[test]
    fn test_status_bar_full() {
        let output = render_to_string(60, 1, |frame| {
            StatusBar::new()
                .label("Catalog")
                .position(5, 12)
                .end_of_feed(true)
                .help("j:down  q:quit")
                .render(frame, frame.area());
        });

        assert!(output.contains("Catalog"));
        assert!(output.contains("5/12 "));
        assert!(output.contains("j:down"));
    }

    #[test]
    fn test_status_bar_marks_open_ended_total() {
        let output = render_to_string(60, 1, |frame| {
            StatusBar::new()
                .label("Catalog")
                .loading("Loading more...")
                .position(1, 8)
                .render(frame, frame.area());
        });

        assert!(output.contains("Loading more"));
        assert!(output.contains("1/8+"));
    }

    #[test]
    fn test_status_bar_minimal() {
        let output = render_to_string(40, 1, |frame| {
            StatusBar::new()
                .label("Test")
                .help("q:quit")
                .render(frame, frame.area());
        });

        assert!(output.contains("Test"));
        assert!(output.contains("q:quit"));
    }
}
