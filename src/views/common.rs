use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Paragraph, Wrap},
};

/// Fixed colors shared by every view.
pub mod palette {
    use ratatui::style::Color;

    pub const FOREGROUND: Color = Color::Reset;
    pub const DIM: Color = Color::DarkGray;
    pub const BORDER: Color = Color::Gray;
    pub const ACCENT: Color = Color::Cyan;
    pub const PRICE: Color = Color::Green;
    pub const WARNING: Color = Color::Yellow;
    pub const ERROR: Color = Color::Red;
    pub const SELECTION_BG: Color = Color::Rgb(40, 44, 52);
    pub const STATUS_BAR_BG: Color = Color::Blue;
    pub const STATUS_BAR_FG: Color = Color::White;
}

pub fn dim_style() -> Style {
    Style::default().fg(palette::DIM)
}

pub fn border_style() -> Style {
    Style::default().fg(palette::BORDER)
}

pub fn accent_style() -> Style {
    Style::default()
        .fg(palette::ACCENT)
        .add_modifier(Modifier::BOLD)
}

/// Render an error message in a bordered block, with a hint underneath.
pub fn render_error(frame: &mut Frame, error: &str, hint: &str, area: Rect) {
    let text = if hint.is_empty() {
        error.to_string()
    } else {
        format!("{error}\n\n{hint}")
    };
    let widget = Paragraph::new(text)
        .style(Style::default().fg(palette::ERROR))
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style())
                .title("Error"),
        );
    frame.render_widget(widget, area);
}

/// Foreground for a status word, e.g. "Loading" or "Error".
pub fn status_color(is_error: bool) -> Color {
    if is_error {
        palette::ERROR
    } else {
        palette::WARNING
    }
}
