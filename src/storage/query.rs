//! Read API types and SQL filter construction

use crate::storage::StoredListing;
use crate::ConfigError;
use rusqlite::types::Value;
use serde::Serialize;
use std::str::FromStr;

/// Default page size
pub const DEFAULT_LIMIT: u32 = 50;
/// Largest accepted page size
pub const MAX_LIMIT: u32 = 200;
/// Price ceiling applied by `cheap_only` unless overridden
pub const DEFAULT_CHEAP_THRESHOLD: i64 = 2_000_000;

/// Sort keys accepted by the read API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    PriceAsc,
    PriceDesc,
    Recent,
    AreaAsc,
    AreaDesc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::Recent => "recent",
            Self::AreaAsc => "area_asc",
            Self::AreaDesc => "area_desc",
        }
    }

    /// ORDER BY clause; listings without an area always sort last
    pub(crate) fn order_by(&self) -> &'static str {
        match self {
            Self::PriceAsc => "price ASC, id ASC",
            Self::PriceDesc => "price DESC, id ASC",
            Self::Recent => "posted_at DESC, id DESC",
            Self::AreaAsc => "area IS NULL, area ASC, id ASC",
            Self::AreaDesc => "area IS NULL, area DESC, id ASC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "price_asc" => Ok(Self::PriceAsc),
            "price_desc" => Ok(Self::PriceDesc),
            "recent" => Ok(Self::Recent),
            "area_asc" => Ok(Self::AreaAsc),
            "area_desc" => Ok(Self::AreaDesc),
            other => Err(ConfigError::Validation(format!("Unknown sort key: {}", other))),
        }
    }
}

/// Filters, sort and page for listing queries
///
/// Every filter is optional; the default query returns the first page of
/// active listings, cheapest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingQuery {
    /// Case-insensitive substring of title or address
    pub q: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub cheap_only: bool,
    /// Ceiling for `cheap_only` (default 2,000,000)
    pub cheap_threshold: Option<i64>,
    pub district: Option<String>,
    /// Origin names (`phongtro123`, `facebook`, ...)
    pub sources: Vec<String>,
    pub min_area: Option<f64>,
    pub max_area: Option<f64>,
    pub owner_only: bool,
    pub has_images: bool,
    pub sort: SortOrder,
    /// 1-based page number
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListingQuery {
    /// Page size after applying the default and the cap
    pub fn effective_limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// 1-based page number, never below 1
    pub fn effective_page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub(crate) fn offset(&self) -> i64 {
        i64::from(self.effective_page() - 1) * i64::from(self.effective_limit())
    }

    /// Builds the WHERE clause and its bound values
    pub(crate) fn where_clause(&self) -> (String, Vec<Value>) {
        let mut clauses: Vec<String> = vec!["is_active = 1".to_string()];
        let mut values: Vec<Value> = Vec::new();

        if let Some(q) = self.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            clauses.push("search_text LIKE ? ESCAPE '\\'".to_string());
            values.push(Value::Text(format!("%{}%", escape_like(&q.to_lowercase()))));
        }

        if let Some(min) = self.min_price {
            clauses.push("price >= ?".to_string());
            values.push(Value::Integer(min));
        }
        if let Some(max) = self.max_price {
            clauses.push("price <= ?".to_string());
            values.push(Value::Integer(max));
        }
        if self.cheap_only {
            clauses.push("price <= ?".to_string());
            values.push(Value::Integer(
                self.cheap_threshold.unwrap_or(DEFAULT_CHEAP_THRESHOLD),
            ));
        }

        if let Some(district) = self.district.as_deref().filter(|d| !d.is_empty()) {
            clauses.push("district = ?".to_string());
            values.push(Value::Text(district.to_string()));
        }

        let sources: Vec<&str> = self
            .sources
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        if !sources.is_empty() {
            let placeholders = vec!["?"; sources.len()].join(", ");
            clauses.push(format!("source IN ({})", placeholders));
            values.extend(sources.into_iter().map(|s| Value::Text(s.to_string())));
        }

        if let Some(min) = self.min_area {
            clauses.push("area >= ?".to_string());
            values.push(Value::Real(min));
        }
        if let Some(max) = self.max_area {
            clauses.push("area <= ?".to_string());
            values.push(Value::Real(max));
        }
        if self.owner_only {
            clauses.push("is_owner = 1".to_string());
        }
        if self.has_images {
            clauses.push("images <> '[]'".to_string());
        }

        (clauses.join(" AND "), values)
    }
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// One page of query results
#[derive(Debug, Clone)]
pub struct ListingPage {
    pub items: Vec<StoredListing>,
    /// Matches across all pages
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

/// Inclusive min/max pair; zeros when the store is empty
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct NumericRange<T> {
    pub min: T,
    pub max: T,
}

/// Summary of stored listings for building filters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingMeta {
    pub districts: Vec<String>,
    pub sources: Vec<String>,
    pub price_range: NumericRange<i64>,
    pub area_range: NumericRange<f64>,
    pub count: u64,
}
