//! Page/per-page handling for list endpoints.
//!
//! A [`PageRequest`] is parsed from query parameters and normalized into a
//! bounded window. [`PaginationMeta`] is always computed against the full
//! result set, so an out-of-range page yields an empty slice with the same
//! meta as any other page.
//!
//! ```
//! use pagination::{PageRequest, paginate};
//!
//! let items: Vec<u32> = (1..=50).collect();
//! let page = paginate(items, PageRequest::new(1, 20));
//!
//! assert_eq!(page.items.len(), 20);
//! assert_eq!(page.meta.total_pages, 3);
//! assert_eq!(page.meta.total_objects, 50);
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Page size used when the client does not ask for one
pub const DEFAULT_PER_PAGE: u64 = 25;

/// Upper bound on the page size a client may request
pub const MAX_PER_PAGE: u64 = 100;

/// Requested page window, as sent by the client.
///
/// Both values are optional and parsed leniently: anything missing,
/// unparsable or non-positive falls back to the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageRequest {
    /// 1-based page number (default 1)
    #[serde(default, deserialize_with = "lenient_int")]
    pub page: Option<i64>,
    /// Items per page (default 25, max 100)
    #[serde(default, deserialize_with = "lenient_int")]
    pub per_page: Option<i64>,
}

impl PageRequest {
    pub fn new(page: i64, per_page: i64) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
        }
    }

    /// Build a request from raw query values, with the same leniency as
    /// deserialization.
    pub fn from_raw(page: Option<&str>, per_page: Option<&str>) -> Self {
        Self {
            page: page.and_then(|p| p.trim().parse().ok()),
            per_page: per_page.and_then(|p| p.trim().parse().ok()),
        }
    }

    /// Effective page number, at least 1
    pub fn page(&self) -> u64 {
        match self.page {
            Some(page) if page > 0 => page as u64,
            _ => 1,
        }
    }

    /// Effective page size within `1..=MAX_PER_PAGE`
    pub fn per_page(&self) -> u64 {
        match self.per_page {
            Some(per_page) if per_page > 0 => (per_page as u64).min(MAX_PER_PAGE),
            _ => DEFAULT_PER_PAGE,
        }
    }

    /// Number of rows to skip in the store query, never above `i64::MAX`
    /// so it always binds as a Postgres `BIGINT`
    pub fn offset(&self) -> u64 {
        (self.page() - 1)
            .saturating_mul(self.per_page())
            .min(i64::MAX as u64)
    }

    /// True when the window starts at or after the last of `total_objects`,
    /// so the page is empty without asking the store for rows
    pub fn is_past_end(&self, total_objects: u64) -> bool {
        self.offset() >= total_objects
    }

    /// Number of rows to fetch in the store query
    pub fn limit(&self) -> u64 {
        self.per_page()
    }
}

/// Pagination metadata reported next to every list response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaginationMeta {
    pub current_page: u64,
    pub per_page: u64,
    pub total_pages: u64,
    pub total_objects: u64,
}

impl PaginationMeta {
    pub fn new(request: &PageRequest, total_objects: u64) -> Self {
        let per_page = request.per_page();
        Self {
            current_page: request.page(),
            per_page,
            total_pages: total_objects.div_ceil(per_page),
            total_objects,
        }
    }
}

/// The `meta` object of a list response: `{"pagination": {...}}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ListMeta {
    pub pagination: PaginationMeta,
}

impl From<PaginationMeta> for ListMeta {
    fn from(pagination: PaginationMeta) -> Self {
        Self { pagination }
    }
}

/// One page of results plus its metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PaginationMeta,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, meta: PaginationMeta) -> Self {
        Self { items, meta }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}

/// Slice an already materialized collection.
pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
    let meta = PaginationMeta::new(&request, items.len() as u64);
    let items = items
        .into_iter()
        .skip(request.offset() as usize)
        .take(request.limit() as usize)
        .collect();

    Page { items, meta }
}

fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Int(n)) => Some(n),
        Some(Raw::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}
