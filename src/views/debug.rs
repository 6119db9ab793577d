use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use super::common::{border_style, dim_style, palette};
use crate::api::CatalogBackend;
use crate::app::App;

pub fn render<C: CatalogBackend>(frame: &mut Frame, app: &App<C>, area: Rect) {
    let block = Block::default()
        .title(" Debug ")
        .borders(Borders::ALL)
        .border_style(border_style());

    let feed = app.snapshot();
    let mut lines = vec![Line::from(vec![
        Span::styled("Feed: ", dim_style()),
        Span::raw(format!(
            "g{} offset={} page={} more={} {:?}",
            feed.generation, feed.offset, feed.page_length, feed.has_more, feed.status
        )),
    ])];

    let task_count = app.debug.running_tasks.len();
    lines.push(Line::from(vec![
        Span::styled("Tasks: ", dim_style()),
        Span::styled(
            task_count.to_string(),
            Style::default().fg(if task_count > 0 {
                palette::WARNING
            } else {
                palette::FOREGROUND
            }),
        ),
    ]));

    for task in &app.debug.running_tasks {
        let elapsed = task.started_at.elapsed();
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(format!("[{}] ", task.id), dim_style()),
            Span::raw(task.description.as_str()),
            Span::styled(format!(" ({:.1?})", elapsed), dim_style()),
        ]));
    }

    // Newest log entries in whatever room is left inside the border.
    let available_lines = area.height.saturating_sub(2) as usize;
    let log_lines = available_lines.saturating_sub(lines.len());

    for entry in app.debug.log.iter().rev().take(log_lines) {
        lines.push(Line::from(Span::styled(
            format!("  {}", entry.message),
            dim_style(),
        )));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryModel;
    use crate::settings::Settings;
    use crate::test_utils::{ScriptedClient, sample_products};
    use crate::views::tests::render_to_string;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_debug_pane_shows_feed_and_tasks() {
        let app = App::new(
            Arc::new(ScriptedClient::gated(sample_products())),
            &Settings::default(),
            QueryModel::new(),
            120,
            14,
        );

        let output = render_to_string(80, 10, |frame| {
            render(frame, &app, frame.area());
        });

        assert!(output.contains("g1 offset=0 page=4"));
        assert!(output.contains("Tasks: 1"));
        assert!(output.contains("Fetch g1 [0..4)"));
    }
}
