mod api;
mod app;
mod cli;
mod event;
mod feed;
mod keys;
mod logging;
mod query;
mod scroll;
mod settings;
mod tui;
mod viewport;
mod views;

#[cfg(test)]
mod test_utils;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Parser;
use ratatui::Frame;

use api::{CatalogBackend, Category, HttpCatalogClient, Product};
use app::{App, Message};
use cli::{Cli, Commands, OutputFormat};
use event::Event;
use feed::{FeedDriver, FeedStatus, Trigger};
use query::QueryModel;
use settings::{Settings, SortPlacement};
use tui::EventHandler;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_dir = settings::config_dir(cli.config_dir.as_ref());
    let mut settings = load_settings(config_dir.as_ref());
    if cli.client_sort {
        settings.sort_placement = SortPlacement::Client;
    }

    let api_url = cli
        .api_url
        .clone()
        .or_else(|| settings.api_url.clone())
        .unwrap_or_else(|| settings::DEFAULT_API_URL.to_string());
    let client = Arc::new(HttpCatalogClient::new(&api_url)?);
    let query = cli.query.to_query();

    match cli.command {
        Some(Commands::Page {
            limit,
            pages,
            format,
        }) => {
            logging::init_stderr(cli.verbose)?;
            run_pages(client, query, limit, pages, format).await
        }
        Some(Commands::Categories { format }) => {
            logging::init_stderr(cli.verbose)?;
            print_categories(client.as_ref(), format).await
        }
        None => {
            let _guard = match &config_dir {
                Some(dir) => Some(logging::init_file(&settings::log_path(dir), cli.verbose)?),
                None => None,
            };
            tracing::info!(%api_url, "starting catalog browser");
            run_tui(client, &settings, query).await
        }
    }
}

fn load_settings(config_dir: Option<&PathBuf>) -> Settings {
    config_dir
        .map(|dir| {
            let path = settings::settings_path(dir);
            Settings::load(&path).unwrap_or_else(|e| {
                eprintln!("Warning: {:#}", e);
                Settings::default()
            })
        })
        .unwrap_or_default()
}

/// Loads up to `pages` pages through the feed and prints what arrived.
async fn run_pages(
    client: Arc<HttpCatalogClient>,
    query: QueryModel,
    limit: usize,
    pages: usize,
    format: OutputFormat,
) -> Result<()> {
    let (mut driver, _) = FeedDriver::mount(client, query, limit);
    driver.settle().await;

    for _ in 1..pages {
        if driver.dispatch(Trigger::NearEndReached).is_none() {
            break;
        }
        driver.settle().await;
    }

    let snapshot = driver.snapshot();
    if snapshot.status == FeedStatus::Error {
        let message = snapshot
            .last_error
            .map(|e| e.user_message())
            .unwrap_or_default();
        if snapshot.items.is_empty() {
            bail!("{message}");
        }
        eprintln!("Warning: stopped early: {message}");
    }

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(snapshot.items.as_slice())
                .context("Failed to serialize products")?;
            println!("{json}");
        }
        OutputFormat::Text => {
            for product in snapshot.items.iter() {
                println!("{}", product_line(product));
            }
            let more = if snapshot.has_more { "more available" } else { "end of catalog" };
            println!("-- {} items, {more}", snapshot.items.len());
        }
    }
    Ok(())
}

fn product_line(product: &Product) -> String {
    let stock = if product.available { "" } else { "  (out of stock)" };
    format!(
        "{:>6}  ${:<7} {}{stock}",
        product.id,
        product.display_price(),
        product.name
    )
}

async fn print_categories(client: &HttpCatalogClient, format: OutputFormat) -> Result<()> {
    use api::CategorySource;

    let roots = client
        .fetch_categories()
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    match format {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&roots).context("Failed to serialize categories")?;
            println!("{json}");
        }
        OutputFormat::Text => {
            let mut out = String::new();
            for root in &roots {
                write_category(&mut out, root, 0);
            }
            print!("{out}");
        }
    }
    Ok(())
}

fn write_category(out: &mut String, category: &Category, depth: usize) {
    out.push_str(&format!(
        "{}{:>4}  {} ({})\n",
        "  ".repeat(depth),
        category.id,
        category.name,
        category.total_products()
    ));
    for child in category.subcategories.values() {
        write_category(out, child, depth + 1);
    }
}

async fn run_tui<C: CatalogBackend>(
    client: Arc<C>,
    settings: &Settings,
    query: QueryModel,
) -> Result<()> {
    let mut terminal = tui::init()?;
    let size = terminal.size()?;
    let mut app = App::new(client, settings, query, size.width, size.height);
    let mut events = EventHandler::new(100);

    app.load_categories();

    loop {
        terminal.draw(|frame| render(&app, frame))?;

        app.poll_async();
        app.check_near_end(Instant::now());

        if app.should_quit {
            break;
        }

        match events.next().await? {
            Event::Key(key) => {
                if let Some(msg) = keys::handle_key(key, &app) {
                    app.update(msg);
                }
            }
            Event::Resize { width, height } => app.update(Message::Resize { width, height }),
            Event::Tick => {}
        }
    }

    tui::restore()?;
    Ok(())
}

fn render<C: CatalogBackend>(app: &App<C>, frame: &mut Frame) {
    use ratatui::layout::{Constraint, Layout};

    let area = frame.area();

    let (main_area, debug_area) = if app.debug.visible {
        let chunks = Layout::vertical([
            Constraint::Min(0),
            Constraint::Length(App::<C>::DEBUG_PANE_HEIGHT),
        ])
        .split(area);
        (chunks[0], Some(chunks[1]))
    } else {
        (area, None)
    };

    views::catalog::render(frame, app, main_area);

    if let Some(debug_area) = debug_area {
        views::debug::render(frame, app, debug_area);
    }
}
