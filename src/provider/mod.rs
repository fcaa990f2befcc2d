//! Site search providers.
//!
//! The feed controller talks to the outside world through the
//! [`SiteSearchProvider`] trait. Two query shapes are supported:
//!
//! - **Location**: sites within a radius of a coordinate
//! - **Keyword**: sites matching an optional keyword and/or category
//!
//! [`tour_api`] is the HTTP implementation against the public tourism open
//! API. Tests substitute in-process fakes.

pub mod tour_api;

use crate::site::{ContentType, Coordinate, QueryAnchor, SitePage};
use std::future::Future;
use thiserror::Error;

pub use tour_api::{TourApiBuildError, TourApiClient};

/// Errors a provider can report for a single page request.
///
/// Clonable so that the feed snapshot can carry the last error to every
/// subscriber.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// Connection, DNS, or TLS failure
    #[error("Network error: {0}")]
    Network(String),
    /// No response within the configured request timeout
    #[error("Request timed out after {0}s")]
    Timeout(u64),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// The API answered with an error result code in its envelope
    #[error("API error {code}: {message}")]
    Api { code: String, message: String },
    /// The body could not be decoded into a page
    #[error("Malformed response: {0}")]
    Decode(String),
    /// Response body exceeded the size limit
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
}

/// The two failure classes the presentation layer distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connectivity failure; retrying may help.
    Network,
    /// Non-2xx status or API-level error payload; may recur deterministically.
    Upstream,
}

impl ProviderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProviderError::Network(_) | ProviderError::Timeout(_) => ErrorKind::Network,
            ProviderError::HttpStatus(_)
            | ProviderError::Api { .. }
            | ProviderError::Decode(_)
            | ProviderError::ResponseTooLarge(_) => ErrorKind::Upstream,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => ProviderError::HttpStatus(status.as_u16()),
            None => ProviderError::Network(err.to_string()),
        }
    }
}

/// A remote paged search over tourist sites.
///
/// Implementations must not retry on their own: every failure is reported
/// to the caller, which decides whether to retry.
pub trait SiteSearchProvider: Send + Sync + 'static {
    /// Sites within `radius_meters` of `coordinate`, nearest first.
    fn fetch_by_location(
        &self,
        coordinate: Coordinate,
        radius_meters: u32,
        category: Option<ContentType>,
        page_no: u32,
        page_size: u32,
    ) -> impl Future<Output = Result<SitePage, ProviderError>> + Send;

    /// Sites matching `keyword`, or every site of `category` when no keyword
    /// is given.
    fn fetch_by_keyword(
        &self,
        keyword: Option<&str>,
        category: Option<ContentType>,
        page_no: u32,
        page_size: u32,
    ) -> impl Future<Output = Result<SitePage, ProviderError>> + Send;
}

/// Dispatch one page request for `anchor` to the matching provider call.
pub async fn fetch_page<P: SiteSearchProvider>(
    provider: &P,
    anchor: &QueryAnchor,
    page_no: u32,
    page_size: u32,
) -> Result<SitePage, ProviderError> {
    match anchor {
        QueryAnchor::Location {
            coordinate,
            radius_meters,
            category,
        } => {
            provider
                .fetch_by_location(*coordinate, *radius_meters, *category, page_no, page_size)
                .await
        }
        QueryAnchor::Keyword { keyword, category } => {
            provider
                .fetch_by_keyword(keyword.as_deref(), *category, page_no, page_size)
                .await
        }
    }
}
