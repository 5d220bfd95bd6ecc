//! Page/limit pagination: query parsing, paged results and navigation links.

use axum::extract::Query;
use axum::http::Uri;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

pub const PAGE_PARAM: &str = "page";
pub const LIMIT_PARAM: &str = "limit";

/// Pagination limits applied when parsing a [`PageQuery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaginationConfig {
    /// Page size used when the request does not carry `limit`.
    pub default_limit: u64,
    /// Largest accepted `limit`.
    pub max_limit: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PaginationError {
    #[error("invalid pagination query: {0}")]
    Malformed(String),
    #[error("page must be greater than 0")]
    ZeroPage,
    #[error("limit must be between 1 and {max}, got {got}")]
    LimitOutOfRange { got: u64, max: u64 },
}

#[derive(Debug, Default, Deserialize)]
struct PageParams {
    page: Option<u64>,
    limit: Option<u64>,
}

/// Parsed pagination query. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: u64,
    pub limit: u64,
}

impl PageQuery {
    /// Parse `page` and `limit` from the query string of `uri`.
    pub fn parse(uri: &Uri, cfg: &PaginationConfig) -> Result<Self, PaginationError> {
        let Query(params) = Query::<PageParams>::try_from_uri(uri)
            .map_err(|e| PaginationError::Malformed(e.body_text()))?;

        let page = params.page.unwrap_or(1);
        if page == 0 {
            return Err(PaginationError::ZeroPage);
        }

        let limit = params.limit.unwrap_or(cfg.default_limit);
        if limit == 0 || limit > cfg.max_limit {
            return Err(PaginationError::LimitOutOfRange {
                got: limit,
                max: cfg.max_limit,
            });
        }

        Ok(Self { page, limit })
    }

    /// Number of items to skip for this page.
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// Result of a paged listing. `total` counts all matching items, not just this page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult<T> {
    pub total: u64,
    pub items: Vec<T>,
}

impl<T> PageResult<T> {
    pub fn new(total: u64, items: Vec<T>) -> Self {
        Self { total, items }
    }

    pub fn empty() -> Self {
        Self {
            total: 0,
            items: Vec::new(),
        }
    }

    /// Map items while preserving the total.
    pub fn map_items<U>(self, f: impl FnMut(T) -> U) -> PageResult<U> {
        PageResult {
            total: self.total,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}

/// Navigation links of a paged response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLinks {
    #[serde(rename = "self")]
    pub self_link: String,
    pub first: String,
    pub last: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

/// Last page number for `total` items, never below 1.
pub fn last_page(total: u64, limit: u64) -> u64 {
    if limit == 0 {
        return 1;
    }
    total.div_ceil(limit).max(1)
}

/// Build navigation links from the request uri, the total count and the parsed query.
///
/// Links keep the request path and every non-pagination query parameter.
pub fn get_links(uri: &Uri, total: u64, query: &PageQuery) -> PageLinks {
    let kept: Vec<(String, String)> = uri
        .query()
        .map(|q| {
            form_urlencoded::parse(q.as_bytes())
                .filter(|(k, _)| k != PAGE_PARAM && k != LIMIT_PARAM)
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect()
        })
        .unwrap_or_default();

    let link = |page: u64| {
        let mut ser = form_urlencoded::Serializer::new(String::new());
        for (k, v) in &kept {
            ser.append_pair(k, v);
        }
        ser.append_pair(PAGE_PARAM, &page.to_string());
        ser.append_pair(LIMIT_PARAM, &query.limit.to_string());
        format!("{}?{}", uri.path(), ser.finish())
    };

    let last = last_page(total, query.limit);

    PageLinks {
        self_link: link(query.page),
        first: link(1),
        last: link(last),
        prev: (query.page > 1).then(|| link((query.page - 1).min(last))),
        next: (query.page < last).then(|| link(query.page + 1)),
    }
}
