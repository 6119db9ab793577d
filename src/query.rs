use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Field the backend orders a feed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortField {
    #[default]
    Price,
}

impl SortField {
    pub fn param(&self) -> &'static str {
        match self {
            SortField::Price => "price",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn param(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "price ↑",
            SortDirection::Descending => "price ↓",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

impl std::str::FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            _ => Err(format!("Invalid sort direction: {s}. Use 'asc' or 'desc'")),
        }
    }
}

/// Immutable description of the active filter and sort criteria.
///
/// Equality is structural: any differing field is a different query and
/// invalidates whatever pagination state was built for the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct QueryModel {
    pub category_ids: BTreeSet<u64>,
    pub search_text: Option<String>,
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
}

impl QueryModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_categories(mut self, ids: impl IntoIterator<Item = u64>) -> Self {
        self.category_ids = ids.into_iter().collect();
        self
    }

    /// Blank or whitespace-only search text is treated as no search.
    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.search_text = if text.trim().is_empty() {
            None
        } else {
            Some(text)
        };
        self
    }

    pub fn with_sort(mut self, field: SortField, direction: SortDirection) -> Self {
        self.sort_field = field;
        self.sort_direction = direction;
        self
    }
}

/// Structural equality, used to decide whether a new query warrants a reset.
pub fn equals(a: &QueryModel, b: &QueryModel) -> bool {
    a == b
}

/// Maps a query and window onto the parameter set `/products` expects.
///
/// Categories are emitted in ascending order, one pair per identifier.
pub fn build_request_parameters(
    query: &QueryModel,
    offset: usize,
    limit: usize,
) -> Vec<(&'static str, String)> {
    let mut params: Vec<(&'static str, String)> = query
        .category_ids
        .iter()
        .map(|id| ("category_ids", id.to_string()))
        .collect();

    if let Some(search) = &query.search_text {
        params.push(("search", search.clone()));
    }

    params.push(("sort_by", query.sort_field.param().to_string()));
    params.push(("sort_order", query.sort_direction.param().to_string()));
    params.push(("limit", limit.to_string()));
    params.push(("offset", offset.to_string()));
    params
}

/// Anything the feed can order by price.
pub trait Priced {
    fn price(&self) -> f64;
}

/// Orders already-loaded items by price for display.
///
/// Used only when sorting is done on the client. The result is a view over
/// the loaded slice; pagination bookkeeping never looks at it. The sort is
/// stable, so equal prices keep their arrival order.
pub fn sort_loaded<T: Priced>(items: &[T], direction: SortDirection) -> Vec<&T> {
    let mut sorted: Vec<&T> = items.iter().collect();
    sorted.sort_by(|a, b| {
        let ord = a.price().partial_cmp(&b.price()).unwrap_or(Ordering::Equal);
        match direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });
    sorted
}
