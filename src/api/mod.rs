mod client;
mod error;
mod types;

pub use client::{CatalogBackend, CatalogClient, CategorySource, HttpCatalogClient};
pub use error::FetchError;
pub use types::{Category, Page, Product};
