//! Shared error type for the article fetch stage.

use thiserror::Error;

/// Errors from querying the wiki API. Fatal to the run; mapped to exit code 2.
///
/// A missing article is not an error: `WikiClient::fetch_article` returns
/// `Ok(None)` for it and the entry is skipped.
#[derive(Debug, Error)]
pub enum WikiError {
    #[error("network error: could not reach {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} when querying {url}")]
    HttpStatus { status: u16, url: String },

    #[error("failed to read API response body: {source}")]
    BodyRead {
        #[source]
        source: reqwest::Error,
    },

    #[error("could not decode API response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected API response from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },
}
