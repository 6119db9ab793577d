//! Test data builders and a scripted catalog backend.

use std::sync::Mutex;

use tokio::sync::oneshot;

use crate::api::{CatalogClient, Category, CategorySource, FetchError, Page, Product};
use crate::query::{Priced, QueryModel, SortDirection};

pub struct ProductBuilder {
    id: u64,
    name: String,
    price: f64,
    description: String,
    category_id: Option<u64>,
    available: bool,
}

impl Default for ProductBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
impl ProductBuilder {
    pub fn new() -> Self {
        Self {
            id: 1,
            name: "Test Product".to_string(),
            price: 100.0,
            description: "A product".to_string(),
            category_id: Some(1),
            available: true,
        }
    }

    pub fn id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn category(mut self, id: u64) -> Self {
        self.category_id = Some(id);
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn build(self) -> Product {
        Product {
            id: self.id,
            slug: format!("product-{}", self.id),
            name: self.name,
            price: self.price,
            description: self.description,
            images: vec![],
            category_id: self.category_id,
            available: self.available,
            attributes: vec![],
        }
    }
}

/// Six products over three categories. Ascending by price the ids run
/// 3, 4, 1, 2, 5, 6.
pub fn sample_products() -> Vec<Product> {
    vec![
        ProductBuilder::new()
            .id(1)
            .name("Cordless Drill")
            .price(89.9)
            .category(1)
            .build(),
        ProductBuilder::new()
            .id(2)
            .name("Angle Grinder")
            .price(120.0)
            .category(1)
            .build(),
        ProductBuilder::new()
            .id(3)
            .name("Garden Hose")
            .price(15.5)
            .category(2)
            .build(),
        ProductBuilder::new()
            .id(4)
            .name("Pruning Shears")
            .price(22.0)
            .category(2)
            .unavailable()
            .build(),
        ProductBuilder::new()
            .id(5)
            .name("Concrete Mixer")
            .price(640.0)
            .category(3)
            .build(),
        ProductBuilder::new()
            .id(6)
            .name("Vibratory Plate")
            .price(980.0)
            .category(3)
            .build(),
    ]
}

pub fn sample_categories() -> Vec<Category> {
    let leaf = |id: u64, name: &str, count: u64| Category {
        id,
        name: name.to_string(),
        slug: name.to_lowercase(),
        parent_id: None,
        product_count: count,
        subcategories: Default::default(),
    };
    vec![leaf(1, "Tools", 2), leaf(2, "Garden", 2), leaf(3, "Construction", 2)]
}

pub type Call = (QueryModel, usize, usize);

struct Gate {
    query: QueryModel,
    release: Option<oneshot::Sender<()>>,
}

/// In-memory catalog that filters, sorts and slices like the real backend.
///
/// A gated client holds every response until the test releases it, which
/// lets tests complete requests in any order.
pub struct ScriptedClient {
    catalog: Vec<Product>,
    categories: Vec<Category>,
    gated: bool,
    failures: Mutex<Vec<FetchError>>,
    calls: Mutex<Vec<Call>>,
    gates: Mutex<Vec<Gate>>,
}

#[allow(dead_code)]
impl ScriptedClient {
    pub fn serving(catalog: Vec<Product>) -> Self {
        Self {
            catalog,
            categories: sample_categories(),
            gated: false,
            failures: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            gates: Mutex::new(Vec::new()),
        }
    }

    pub fn gated(catalog: Vec<Product>) -> Self {
        Self {
            gated: true,
            ..Self::serving(catalog)
        }
    }

    /// The next call fails with `error` instead of serving a page.
    pub fn fail_next(&self, error: FetchError) {
        self.failures.lock().unwrap().insert(0, error);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn categories(&self) -> Vec<Category> {
        self.categories.clone()
    }

    pub async fn wait_for_calls(&self, n: usize) {
        for _ in 0..10_000 {
            if self.calls.lock().unwrap().len() >= n {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("expected {n} calls, saw {:?}", self.calls());
    }

    /// Lets the `index`-th call (in call order) complete.
    pub fn release(&self, index: usize) {
        let sender = self.gates.lock().unwrap()[index].release.take();
        if let Some(tx) = sender {
            let _ = tx.send(());
        }
    }

    /// Lets the oldest held call for `query` complete.
    pub fn release_for(&self, query: &QueryModel) {
        let sender = self
            .gates
            .lock()
            .unwrap()
            .iter_mut()
            .find(|g| &g.query == query && g.release.is_some())
            .and_then(|g| g.release.take());
        if let Some(tx) = sender {
            let _ = tx.send(());
        }
    }

    fn serve(&self, query: &QueryModel, offset: usize, limit: usize) -> Page<Product> {
        let mut matching: Vec<&Product> = self
            .catalog
            .iter()
            .filter(|p| {
                query.category_ids.is_empty()
                    || p.category_id
                        .is_some_and(|id| query.category_ids.contains(&id))
            })
            .filter(|p| {
                query
                    .search_text
                    .as_ref()
                    .is_none_or(|s| p.name.to_lowercase().contains(&s.to_lowercase()))
            })
            .collect();
        matching.sort_by(|a, b| {
            let ord = a.price().total_cmp(&b.price());
            match query.sort_direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        });
        let items = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Page::new(items, offset, limit)
    }
}

impl CatalogClient for ScriptedClient {
    type Item = Product;

    async fn fetch_page(
        &self,
        query: &QueryModel,
        offset: usize,
        limit: usize,
    ) -> Result<Page<Product>, FetchError> {
        self.calls
            .lock()
            .unwrap()
            .push((query.clone(), offset, limit));

        let failure = self.failures.lock().unwrap().pop();
        let result = match failure {
            Some(error) => Err(error),
            None => Ok(self.serve(query, offset, limit)),
        };

        if self.gated {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().push(Gate {
                query: query.clone(),
                release: Some(tx),
            });
            if rx.await.is_err() {
                return Err(FetchError::Network("gate dropped".into()));
            }
        }
        result
    }
}

impl CategorySource for ScriptedClient {
    async fn fetch_categories(&self) -> Result<Vec<Category>, FetchError> {
        Ok(self.categories.clone())
    }
}
