use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::query::{QueryModel, SortDirection, SortField};

#[derive(Parser, Debug)]
#[command(name = "feed")]
#[command(about = "Browse a paginated product catalog in the terminal", long_about = None)]
pub struct Cli {
    /// Catalog API base URL (default: settings file, then http://localhost:8000)
    #[arg(long, value_name = "URL", global = true)]
    pub api_url: Option<String>,

    /// Custom config directory (default: ~/.config/catalog-feed)
    #[arg(long, value_name = "DIR", global = true)]
    pub config_dir: Option<PathBuf>,

    /// Enable verbose logging (prints log path, sets DEBUG level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub query: QueryArgs,

    /// Sort loaded items locally instead of asking the server
    #[arg(long)]
    pub client_sort: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Args, Debug, Default)]
pub struct QueryArgs {
    /// Restrict to a category id (repeatable)
    #[arg(short, long = "category", value_name = "ID", global = true)]
    pub categories: Vec<u64>,

    /// Search product names
    #[arg(short, long, global = true)]
    pub search: Option<String>,

    /// Price ordering (asc or desc)
    #[arg(long, default_value = "asc", global = true)]
    pub sort: SortDirection,
}

impl QueryArgs {
    pub fn to_query(&self) -> QueryModel {
        QueryModel::new()
            .with_categories(self.categories.iter().copied())
            .with_search(self.search.clone().unwrap_or_default())
            .with_sort(SortField::Price, self.sort)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load pages through the feed controller and print them
    Page {
        /// Page length to request
        #[arg(short, long, default_value_t = 20)]
        limit: usize,

        /// Number of pages to load (stops early at the end of the feed)
        #[arg(short, long, default_value_t = 1)]
        pages: usize,

        /// Output format (text or json)
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
    /// Print the category tree
    Categories {
        /// Output format (text or json)
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid format: {s}. Use 'text' or 'json'")),
        }
    }
}
