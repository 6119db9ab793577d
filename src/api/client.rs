use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Url;

use super::error::FetchError;
use super::types::{Category, Page, Product, RawProduct, category_roots};
use crate::query::{QueryModel, build_request_parameters};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Performs one request/response page fetch.
///
/// Implementations hold no pagination state; every call is fully described
/// by its arguments.
pub trait CatalogClient: Send + Sync + 'static {
    type Item: Clone + Send + Sync + 'static;

    fn fetch_page(
        &self,
        query: &QueryModel,
        offset: usize,
        limit: usize,
    ) -> impl Future<Output = Result<Page<Self::Item>, FetchError>> + Send;
}

/// Supplies the category tree used to build category filters.
pub trait CategorySource: Send + Sync + 'static {
    fn fetch_categories(&self) -> impl Future<Output = Result<Vec<Category>, FetchError>> + Send;
}

/// A product catalog with categories, as browsed by the terminal UI.
pub trait CatalogBackend: CatalogClient<Item = Product> + CategorySource {}

impl<T> CatalogBackend for T where T: CatalogClient<Item = Product> + CategorySource {}

#[derive(Clone)]
pub struct HttpCatalogClient {
    http: reqwest::Client,
    products_url: Url,
    categories_url: Url,
}

impl HttpCatalogClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        // Url::join drops the last segment unless the base ends in a slash.
        let base = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base = Url::parse(&base).with_context(|| format!("Invalid API URL '{base_url}'"))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            http,
            products_url: base.join("products")?,
            categories_url: base.join("categories")?,
        })
    }

    pub fn request_url(&self, query: &QueryModel, offset: usize, limit: usize) -> Url {
        let mut url = self.products_url.clone();
        url.query_pairs_mut()
            .extend_pairs(build_request_parameters(query, offset, limit));
        url
    }
}

impl CatalogClient for HttpCatalogClient {
    type Item = Product;

    async fn fetch_page(
        &self,
        query: &QueryModel,
        offset: usize,
        limit: usize,
    ) -> Result<Page<Product>, FetchError> {
        let url = self.request_url(query, offset, limit);
        tracing::debug!(%url, "fetching page");

        let raw: Vec<RawProduct> = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let items: Vec<Product> = raw.into_iter().map(Product::from_raw).collect();
        let page = Page::new(items, offset, limit);
        tracing::debug!(
            offset,
            limit,
            received = page.items.len(),
            last = page.is_last(),
            "page received"
        );
        Ok(page)
    }
}

impl CategorySource for HttpCatalogClient {
    async fn fetch_categories(&self) -> Result<Vec<Category>, FetchError> {
        tracing::debug!(url = %self.categories_url, "fetching categories");
        let tree: BTreeMap<String, Category> = self
            .http
            .get(self.categories_url.clone())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(category_roots(tree))
    }
}
