// Owner-scoped query construction for log entries
// Filter parsing, pagination normalization and SQL generation

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::{Postgres, QueryBuilder};
use utoipa::IntoParams;
use uuid::Uuid;

use crate::logs::models::{LogEntry, DATE_FORMAT};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

const SELECT_COLUMNS: &str = "SELECT id, user_id, name, location, spring_type, features, \
     visit_date, rating, comment, created_at, updated_at FROM log_entries";

/// Raw pagination parameters from the query string
///
/// Kept as strings so bad input falls back to defaults instead of
/// rejecting the request.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListParams {
    /// 1-based page number (default 1)
    pub page: Option<String>,
    /// Items per page, 1 to 100 (default 10)
    pub limit: Option<String>,
}

/// Raw filter parameters from the query string
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct FilterParams {
    /// Exact spring type; an unknown value matches nothing
    pub spring_type: Option<String>,
    /// Case-insensitive substring of the location
    pub location: Option<String>,
    /// Inclusive minimum rating; 0 means no constraint
    pub min_rating: Option<String>,
    /// Inclusive lower bound on visit date (`YYYY-MM-DD`)
    pub start_date: Option<String>,
    /// Inclusive upper bound on visit date (`YYYY-MM-DD`)
    pub end_date: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Normalized pagination window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Page {
    /// Clamp raw values into a usable window; never fails
    pub fn normalize(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .map(|p| p.min(u32::MAX as i64) as u32)
            .unwrap_or(DEFAULT_PAGE);

        let limit = limit
            .and_then(|l| l.trim().parse::<i64>().ok())
            .filter(|l| (1..=MAX_LIMIT as i64).contains(l))
            .map(|l| l as u32)
            .unwrap_or(DEFAULT_LIMIT);

        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }

    pub fn total_pages(&self, total_count: i64) -> i64 {
        if total_count <= 0 {
            0
        } else {
            (total_count + self.limit as i64 - 1) / self.limit as i64
        }
    }
}

impl From<&ListParams> for Page {
    fn from(params: &ListParams) -> Self {
        Page::normalize(params.page.as_deref(), params.limit.as_deref())
    }
}

impl From<&FilterParams> for Page {
    fn from(params: &FilterParams) -> Self {
        Page::normalize(params.page.as_deref(), params.limit.as_deref())
    }
}

/// Optional, conjunctive constraints on a caller's log entries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogFilter {
    /// Compared verbatim against the stored type
    pub spring_type: Option<String>,
    pub location: Option<String>,
    pub min_rating: Option<i16>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl From<&FilterParams> for LogFilter {
    fn from(params: &FilterParams) -> Self {
        let non_empty = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let date = |value: &Option<String>| {
            non_empty(value).and_then(|v| NaiveDate::parse_from_str(&v, DATE_FORMAT).ok())
        };

        Self {
            spring_type: non_empty(&params.spring_type),
            location: non_empty(&params.location),
            // 0, out of range and unparsable all mean "no constraint"
            min_rating: non_empty(&params.min_rating)
                .and_then(|r| r.parse::<i16>().ok())
                .filter(|r| (1..=5).contains(r)),
            start_date: date(&params.start_date),
            end_date: date(&params.end_date),
        }
    }
}

impl LogFilter {
    /// In-process evaluation of the same predicate the SQL applies
    pub fn matches(&self, entry: &LogEntry) -> bool {
        if let Some(spring_type) = &self.spring_type {
            if entry.spring_type.as_str() != spring_type {
                return false;
            }
        }
        if let Some(location) = &self.location {
            if !entry
                .location
                .to_lowercase()
                .contains(&location.to_lowercase())
            {
                return false;
            }
        }
        if let Some(min_rating) = self.min_rating {
            if entry.rating < min_rating {
                return false;
            }
        }
        if let Some(start) = self.start_date {
            if entry.visit_date < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if entry.visit_date > end {
                return false;
            }
        }
        true
    }
}

/// Canonical listing order: most recent visit first
///
/// Ties break on creation time then id so pages never overlap.
pub fn listing_order(a: &LogEntry, b: &LogEntry) -> Ordering {
    b.visit_date
        .cmp(&a.visit_date)
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| b.id.cmp(&a.id))
}

/// Escape `%`, `_` and `\` so user input matches literally inside ILIKE
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// A filter bound to the caller that owns the rows
///
/// The owner is not optional: every statement built here starts its WHERE
/// clause with `user_id = $1`.
#[derive(Debug, Clone)]
pub struct LogQuery {
    owner: Uuid,
    filter: LogFilter,
}

impl LogQuery {
    pub fn new(owner: Uuid, filter: LogFilter) -> Self {
        Self { owner, filter }
    }

    /// Every entry of `owner`, no extra constraints
    pub fn all(owner: Uuid) -> Self {
        Self::new(owner, LogFilter::default())
    }

    pub fn owner(&self) -> Uuid {
        self.owner
    }

    pub fn filter(&self) -> &LogFilter {
        &self.filter
    }

    pub fn matches(&self, entry: &LogEntry) -> bool {
        entry.user_id == self.owner && self.filter.matches(entry)
    }

    fn push_where(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        qb.push(" WHERE user_id = ").push_bind(self.owner);

        if let Some(spring_type) = &self.filter.spring_type {
            qb.push(" AND spring_type = ").push_bind(spring_type.clone());
        }
        if let Some(location) = &self.filter.location {
            qb.push(" AND location ILIKE ")
                .push_bind(format!("%{}%", escape_like(location)))
                .push(" ESCAPE '\\'");
        }
        if let Some(min_rating) = self.filter.min_rating {
            qb.push(" AND rating >= ").push_bind(min_rating);
        }
        if let Some(start) = self.filter.start_date {
            qb.push(" AND visit_date >= ").push_bind(start);
        }
        if let Some(end) = self.filter.end_date {
            qb.push(" AND visit_date <= ").push_bind(end);
        }
    }

    /// `SELECT COUNT(*)` over the full filtered set
    pub fn count_query(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM log_entries");
        self.push_where(&mut qb);
        qb
    }

    /// Every matching row in listing order
    pub fn select_query(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(SELECT_COLUMNS);
        self.push_where(&mut qb);
        qb.push(" ORDER BY visit_date DESC, created_at DESC, id DESC");
        qb
    }

    /// One page of matching rows in listing order
    pub fn page_query(&self, page: Page) -> QueryBuilder<'static, Postgres> {
        let mut qb = self.select_query();
        qb.push(" LIMIT ")
            .push_bind(page.limit as i64)
            .push(" OFFSET ")
            .push_bind(page.offset());
        qb
    }
}
