//! Query string access and the paginated response envelope

use std::convert::Infallible;
use std::str::FromStr;

use axum::{
    async_trait,
    extract::{FromRequestParts, OriginalUri},
    http::request::Parts,
};
use serde::Serialize;

use crate::services::{PageRequest, Paginated};

/// Decoded query string of the current request, repeated keys preserved.
///
/// Also remembers the full request path so pages can link to their
/// neighbours.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    path: String,
    pairs: Vec<(String, String)>,
}

impl ListQuery {
    pub fn new(path: &str, query: Option<&str>) -> Self {
        let pairs = query
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        Self {
            path: path.to_string(),
            pairs,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn all(&self, key: &str) -> Vec<String> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .collect()
    }

    /// Parsed value, unparsable input counts as absent
    pub fn number<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.trim().parse().ok())
    }

    /// `1` and `true` switch a filter on
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.get(key).map(str::trim), Some("1") | Some("true"))
    }

    pub fn page_request(&self, default_limit: u64) -> PageRequest {
        PageRequest::new(self.number("page"), self.number("limit"), default_limit)
    }

    /// Link to `page` keeping every other parameter, page 1 drops the parameter
    fn link(&self, page: u64) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (k, v) in self.pairs.iter().filter(|(k, _)| k != "page") {
            serializer.append_pair(k, v);
        }
        if page > 1 {
            serializer.append_pair("page", &page.to_string());
        }
        let query = serializer.finish();
        if query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, query)
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ListQuery
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Nested routers see a stripped path
        let uri = parts
            .extensions
            .get::<OriginalUri>()
            .map(|original| original.0.clone())
            .unwrap_or_else(|| parts.uri.clone());
        Ok(ListQuery::new(uri.path(), uri.query()))
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(query: &ListQuery, request: PageRequest, paginated: Paginated<T>) -> Self {
        let has_next = request.page.saturating_mul(request.limit) < paginated.total;
        Self {
            count: paginated.total,
            next: has_next.then(|| query.link(request.page + 1)),
            previous: (request.page > 1).then(|| query.link(request.page - 1)),
            results: paginated.items,
        }
    }
}
