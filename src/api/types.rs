use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::query::Priced;

/// Product as returned by `/products`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawProduct {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    pub price: f64,
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub category_id: Option<u64>,
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: u64,
    pub name: String,
    pub slug: String,
    pub price: f64,
    pub description: String,
    pub images: Vec<String>,
    pub category_id: Option<u64>,
    pub available: bool,
    pub attributes: Vec<Attribute>,
}

impl Product {
    pub fn from_raw(raw: RawProduct) -> Self {
        Product {
            id: raw.id,
            name: html_escape::decode_html_entities(&raw.name).to_string(),
            slug: raw.slug,
            price: raw.price,
            description: raw
                .description
                .map(|d| html_escape::decode_html_entities(&d).to_string())
                .unwrap_or_default(),
            images: raw.images,
            category_id: raw.category_id,
            available: raw.available,
            attributes: raw.attributes,
        }
    }

    /// Whole-unit display price, rounded up.
    pub fn display_price(&self) -> u64 {
        self.price.max(0.0).ceil() as u64
    }
}

impl Priced for Product {
    fn price(&self) -> f64 {
        self.price
    }
}

/// One bounded batch of items from a single fetch.
///
/// Fewer items than `requested_limit` means the backend has nothing more
/// for this query.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub requested_offset: usize,
    pub requested_limit: usize,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, requested_offset: usize, requested_limit: usize) -> Self {
        Self {
            items,
            requested_offset,
            requested_limit,
        }
    }

    pub fn is_last(&self) -> bool {
        self.items.len() < self.requested_limit
    }
}

/// Category node from `/categories`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    pub parent_id: Option<u64>,
    #[serde(default)]
    pub product_count: u64,
    /// Keyed by id; the backend serializes this as a JSON object.
    #[serde(default)]
    pub subcategories: BTreeMap<String, Category>,
}

impl Category {
    /// This category's id followed by every descendant id, depth first.
    pub fn subtree_ids(&self) -> Vec<u64> {
        let mut ids = vec![self.id];
        for child in self.subcategories.values() {
            ids.extend(child.subtree_ids());
        }
        ids
    }

    /// Product count including all descendants.
    pub fn total_products(&self) -> u64 {
        self.product_count
            + self
                .subcategories
                .values()
                .map(Category::total_products)
                .sum::<u64>()
    }
}

/// Roots of the category tree, ordered by id.
pub fn category_roots(tree: BTreeMap<String, Category>) -> Vec<Category> {
    let mut roots: Vec<Category> = tree.into_values().collect();
    roots.sort_by_key(|c| c.id);
    roots
}
