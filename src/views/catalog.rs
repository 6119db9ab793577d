use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::common::{accent_style, border_style, dim_style, palette, render_error};
use super::status_bar::StatusBar;
use crate::api::{CatalogBackend, Product};
use crate::app::App;
use crate::feed::FeedStatus;
use crate::keys::browse_hints;

pub fn render<C: CatalogBackend>(frame: &mut Frame, app: &App<C>, area: Rect) {
    let chunks = Layout::vertical([
        Constraint::Length(1), // Query summary or search prompt
        Constraint::Min(0),    // Product list
        Constraint::Length(1), // Status bar
    ])
    .split(area);

    render_header(frame, app, chunks[0]);
    render_product_list(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);
}

fn render_header<C: CatalogBackend>(frame: &mut Frame, app: &App<C>, area: Rect) {
    if app.search.editing {
        let line = Line::from(vec![
            Span::styled("Search: ", accent_style()),
            Span::raw(app.search.buffer.as_str()),
            Span::styled("▏", accent_style()),
            Span::styled("  Enter:apply  Esc:cancel", dim_style()),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let query = app.query();
    let category = match app.active_category() {
        Some(c) => c.name.clone(),
        None if query.category_ids.is_empty() => "All".to_string(),
        None => query
            .category_ids
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(","),
    };
    let search = query.search_text.as_deref().unwrap_or("-");

    let mut line = Line::from(vec![
        Span::styled("Category ", dim_style()),
        Span::styled(category, accent_style()),
        Span::styled("  Search ", dim_style()),
        Span::raw(search.to_string()),
        Span::styled("  Sort ", dim_style()),
        Span::raw(app.sort_direction().label()),
    ]);
    if app.snapshot().status.is_loading() {
        line.push_span(Span::styled("  ⋯", Style::default().fg(palette::WARNING)));
    }
    frame.render_widget(Paragraph::new(line), area);
}

fn render_product_list<C: CatalogBackend>(frame: &mut Frame, app: &App<C>, area: Rect) {
    let snapshot = app.snapshot();
    let products = app.visible_items();

    if products.is_empty() {
        match (&snapshot.last_error, snapshot.status) {
            (Some(err), FeedStatus::Error) => {
                let hint = if err.is_network() {
                    "r:retry"
                } else {
                    "r:retry  R:restart"
                };
                render_error(frame, &err.user_message(), hint, area);
            }
            (_, FeedStatus::LoadingInitial) => {
                render_placeholder(frame, "Loading products...", area);
            }
            _ => render_placeholder(frame, "No products match this query.", area),
        }
        return;
    }

    let name_width = area.width.saturating_sub(4 + 5 + 12) as usize;
    let mut items: Vec<ListItem> = products
        .iter()
        .enumerate()
        .map(|(i, product)| product_to_list_item(product, i + 1, name_width))
        .collect();

    match snapshot.status {
        FeedStatus::LoadingMore => items.push(ListItem::new(Line::from(Span::styled(
            "     Loading more...",
            Style::default().fg(palette::WARNING),
        )))),
        FeedStatus::Error => {
            let message = snapshot
                .last_error
                .as_ref()
                .map(|e| e.user_message())
                .unwrap_or_default();
            items.push(ListItem::new(Line::from(Span::styled(
                format!("     {message} (r:retry)"),
                Style::default().fg(palette::ERROR),
            ))));
        }
        _ if !snapshot.has_more => {
            items.push(ListItem::new(Line::from(Span::styled(
                "     End of catalog",
                dim_style(),
            ))));
        }
        _ => {}
    }

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style())
                .title(format!("Products ({})", products.len())),
        )
        .highlight_style(
            Style::default()
                .bg(palette::SELECTION_BG)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ");

    let mut list_state = ListState::default()
        .with_offset(app.scroll_offset)
        .with_selected(Some(app.selected_index));
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn render_placeholder(frame: &mut Frame, text: &str, area: Rect) {
    let widget = Paragraph::new(Span::styled(text.to_string(), dim_style())).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style())
            .title("Products"),
    );
    frame.render_widget(widget, area);
}

fn product_to_list_item(product: &Product, rank: usize, width: usize) -> ListItem<'static> {
    let name_style = if product.available {
        Style::default().fg(palette::FOREGROUND)
    } else {
        Style::default()
            .fg(palette::FOREGROUND)
            .add_modifier(Modifier::DIM)
    };
    let mut title = vec![
        Span::styled(format!("{:>3}. ", rank), dim_style()),
        Span::styled(truncate(&product.name, width), name_style),
        Span::styled(
            format!("  ${}", product.display_price()),
            Style::default().fg(palette::PRICE),
        ),
    ];
    if !product.available {
        title.push(Span::styled(
            "  out of stock",
            Style::default().fg(palette::ERROR),
        ));
    }

    let detail = Line::from(vec![
        Span::raw("     "),
        Span::styled(truncate(&product.description, width), dim_style()),
    ]);

    ListItem::new(vec![Line::from(title), detail])
}

/// Cuts `text` to at most `width` terminal columns, ending in an ellipsis
/// when shortened.
fn truncate(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

fn render_status_bar<C: CatalogBackend>(frame: &mut Frame, app: &App<C>, area: Rect) {
    let snapshot = app.snapshot();
    let hints = browse_hints();
    let error = snapshot.last_error.as_ref().map(|e| e.user_message());
    let loaded = snapshot.items.len();

    let mut bar = StatusBar::new()
        .label("Catalog")
        .position((app.selected_index + 1).min(loaded), loaded)
        .end_of_feed(!snapshot.has_more)
        .help(&hints);
    bar = match snapshot.status {
        FeedStatus::LoadingInitial => bar.loading("Loading..."),
        FeedStatus::LoadingMore => bar.loading("Loading more..."),
        FeedStatus::Error => bar.error(error.as_deref().unwrap_or("Error")),
        FeedStatus::Idle => bar,
    };
    bar.render(frame, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::FetchError;
    use crate::app::Message;
    use crate::query::QueryModel;
    use crate::settings::Settings;
    use crate::test_utils::{ProductBuilder, ScriptedClient, sample_products};
    use crate::views::tests::render_to_string;
    use std::sync::Arc;

    fn app_with(client: ScriptedClient, width: u16, height: u16) -> App<ScriptedClient> {
        App::new(
            Arc::new(client),
            &Settings::default(),
            QueryModel::new(),
            width,
            height,
        )
    }

    async fn settle(app: &mut App<ScriptedClient>) {
        while app.feed.controller().state().in_flight.is_some() {
            let outcome = app.feed.next_outcome().await.unwrap();
            app.handle_outcome(outcome);
        }
    }

    #[tokio::test]
    async fn test_catalog_view_renders_loaded_products() {
        let mut app = app_with(ScriptedClient::serving(sample_products()), 120, 14);
        settle(&mut app).await;

        let output = render_to_string(120, 14, |frame| {
            render(frame, &app, frame.area());
        });

        assert!(output.contains("Category All"));
        assert!(output.contains("Sort price ↑"));
        assert!(output.contains("Products (4)"));
        assert!(output.contains("Garden Hose"));
        assert!(output.contains("$16"));
        assert!(output.contains("out of stock"));
        assert!(output.contains("1/4+"));
    }

    #[tokio::test]
    async fn test_catalog_view_initial_loading() {
        let app = app_with(ScriptedClient::gated(sample_products()), 80, 24);

        let output = render_to_string(80, 24, |frame| {
            render(frame, &app, frame.area());
        });

        assert!(output.contains("Loading products..."));
    }

    #[tokio::test]
    async fn test_catalog_view_initial_error() {
        let client = ScriptedClient::serving(sample_products());
        client.fail_next(FetchError::Network("connection refused".into()));
        let mut app = app_with(client, 80, 24);
        settle(&mut app).await;

        let output = render_to_string(80, 24, |frame| {
            render(frame, &app, frame.area());
        });

        assert!(output.contains("Network error"));
        assert!(output.contains("r:retry"));
    }

    #[tokio::test]
    async fn test_catalog_view_empty_result() {
        let mut app = app_with(ScriptedClient::serving(vec![]), 80, 24);
        settle(&mut app).await;

        let output = render_to_string(80, 24, |frame| {
            render(frame, &app, frame.area());
        });

        assert!(output.contains("No products match"));
    }

    #[tokio::test]
    async fn test_catalog_view_end_of_feed() {
        let mut app = app_with(ScriptedClient::serving(sample_products()), 120, 30);
        settle(&mut app).await;
        app.check_near_end(std::time::Instant::now());
        settle(&mut app).await;

        let output = render_to_string(120, 30, |frame| {
            render(frame, &app, frame.area());
        });

        assert!(output.contains("Products (6)"));
        assert!(output.contains("End of catalog"));
        assert!(output.contains("1/6 "));
    }

    #[tokio::test]
    async fn test_catalog_view_search_prompt() {
        let mut app = app_with(ScriptedClient::serving(sample_products()), 80, 24);
        app.update(Message::StartSearch);
        app.update(Message::SearchChar('d'));
        app.update(Message::SearchChar('r'));

        let output = render_to_string(80, 24, |frame| {
            render(frame, &app, frame.area());
        });

        assert!(output.contains("Search: dr"));
    }

    #[tokio::test]
    async fn test_catalog_view_rounds_price_up() {
        let product = ProductBuilder::new()
            .name("Saw & Blade")
            .description("Steel")
            .build();
        let mut app = app_with(ScriptedClient::serving(vec![product]), 80, 24);
        settle(&mut app).await;

        let output = render_to_string(80, 24, |frame| {
            render(frame, &app, frame.area());
        });

        assert!(output.contains("Saw & Blade"));
        assert!(output.contains("$100"));
    }

    #[test]
    fn test_truncate_adds_ellipsis() {
        assert_eq!(truncate("Cordless Drill", 20), "Cordless Drill");
        assert_eq!(truncate("Cordless Drill", 6), "Cordl…");
    }
}
