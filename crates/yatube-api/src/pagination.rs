use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Query},
    http::{Uri, request::Parts},
};

use yatube_types::api::Page;

/// `?page=` query of every feed. A repeated `page` takes its last value and an
/// unreadable query string counts as no page at all.
#[derive(Debug, Default)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn from_uri(uri: &Uri) -> Self {
        let page = Query::<Vec<(String, String)>>::try_from_uri(uri)
            .map(|Query(pairs)| {
                pairs
                    .into_iter()
                    .filter(|(key, _)| key == "page")
                    .map(|(_, value)| value)
                    .last()
            })
            .unwrap_or_default();
        Self { page }
    }
}

impl<S> FromRequestParts<S> for PageQuery
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_uri(&parts.uri))
    }
}

/// Splits `count` ordered items into pages of `per_page`.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    count: usize,
    per_page: usize,
}

/// A resolved page: which slice of the ordered list it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: usize,
    pub num_pages: usize,
    pub count: usize,
    pub offset: usize,
    pub limit: usize,
}

impl Paginator {
    pub fn new(count: usize, per_page: usize) -> Self {
        Self {
            count,
            per_page: per_page.max(1),
        }
    }

    /// An empty list still has one (empty) page.
    pub fn num_pages(&self) -> usize {
        self.count.div_ceil(self.per_page).max(1)
    }

    /// Resolves a raw `page` value. Missing or non-numeric values give the
    /// first page; numbers outside `1..=num_pages` give the last one.
    pub fn get_page(&self, raw: Option<&str>) -> PageWindow {
        let last = self.num_pages();
        let number = match raw.map(|r| r.trim().parse::<i64>()) {
            Some(Ok(n)) => usize::try_from(n)
                .ok()
                .filter(|n| (1..=last).contains(n))
                .unwrap_or(last),
            Some(Err(_)) | None => 1,
        };

        PageWindow {
            number,
            num_pages: last,
            count: self.count,
            offset: (number - 1) * self.per_page,
            limit: self.per_page,
        }
    }
}

impl PageWindow {
    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn into_page<T>(self, object_list: Vec<T>) -> Page<T> {
        Page {
            number: self.number,
            num_pages: self.num_pages,
            count: self.count,
            has_next: self.has_next(),
            has_previous: self.has_previous(),
            object_list,
        }
    }
}
