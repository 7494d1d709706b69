//! MediaWiki Action API client: article existence checks and rendered HTML extracts.

mod client;
mod error;

pub use client::{PoliteClient, PoliteClientBuilder};
pub use error::WikiError;

use serde::Deserialize;

/// Default Wikipedia language edition.
pub const DEFAULT_LANGUAGE: &str = "en";

/// One article as returned by the API: canonical title plus rendered HTML.
#[derive(Debug, Clone)]
pub struct Article {
    pub title: String,
    pub html: String,
}

/// Response shape for `action=query&prop=extracts` with `formatversion=2`.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    query: Option<QueryBody>,
}

#[derive(Debug, Deserialize)]
struct QueryBody {
    #[serde(default)]
    pages: Vec<PageEntry>,
}

#[derive(Debug, Deserialize)]
struct PageEntry {
    #[serde(default)]
    title: String,
    /// Present and true when the requested title has no article.
    #[serde(default)]
    missing: bool,
    extract: Option<String>,
}

/// API endpoint for a Wikipedia language edition.
pub fn endpoint_for_language(language: &str) -> String {
    format!("https://{}.wikipedia.org/w/api.php", language)
}

/// Client for one wiki. Borrows the shared polite HTTP client.
pub struct WikiClient<'a> {
    endpoint: String,
    http: &'a mut PoliteClient,
}

impl<'a> WikiClient<'a> {
    /// Client for the given Wikipedia language edition (e.g. "en").
    pub fn new(language: &str, http: &'a mut PoliteClient) -> Self {
        WikiClient {
            endpoint: endpoint_for_language(language),
            http,
        }
    }

    /// Client for an explicit api.php endpoint (non-Wikipedia MediaWiki instances).
    pub fn with_endpoint(endpoint: impl Into<String>, http: &'a mut PoliteClient) -> Self {
        WikiClient {
            endpoint: endpoint.into(),
            http,
        }
    }

    /// Query one article by title.
    ///
    /// `Ok(None)` means the article does not exist; the caller skips the
    /// entry. Redirects are followed on the API side, so the returned
    /// article title may differ from the requested one.
    pub fn fetch_article(&mut self, title: &str) -> Result<Option<Article>, WikiError> {
        let params = [
            ("action", "query"),
            ("prop", "extracts"),
            ("format", "json"),
            ("formatversion", "2"),
            ("redirects", "1"),
            ("titles", title),
        ];
        let response = self
            .http
            .get_with_query(&self.endpoint, &params)
            .map_err(|e| WikiError::Network {
                url: self.endpoint.clone(),
                source: e,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(WikiError::HttpStatus {
                status: status.as_u16(),
                url: self.endpoint.clone(),
            });
        }
        let body = response
            .text()
            .map_err(|e| WikiError::BodyRead { source: e })?;
        parse_query_response(&body, &self.endpoint)
    }
}

/// Parse the extracts query payload. A page flagged `missing` is Ok(None);
/// a payload without pages or without an extract is malformed.
fn parse_query_response(body: &str, url: &str) -> Result<Option<Article>, WikiError> {
    let parsed: QueryResponse = serde_json::from_str(body).map_err(|e| WikiError::Decode {
        url: url.to_string(),
        source: e,
    })?;
    let page = parsed
        .query
        .and_then(|q| q.pages.into_iter().next())
        .ok_or_else(|| WikiError::MalformedResponse {
            url: url.to_string(),
            reason: "no pages in query response".to_string(),
        })?;
    if page.missing {
        return Ok(None);
    }
    let html = page.extract.ok_or_else(|| WikiError::MalformedResponse {
        url: url.to_string(),
        reason: format!("page \"{}\" has no extract", page.title),
    })?;
    Ok(Some(Article {
        title: page.title,
        html,
    }))
}
