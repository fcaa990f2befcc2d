//! Observable state of a feed controller.

use crate::provider::{ErrorKind, ProviderError};
use crate::site::{QueryAnchor, SiteSummary};
use std::fmt;
use thiserror::Error;

/// Lifecycle phase of the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedPhase {
    /// No anchor has been set yet.
    #[default]
    Idle,
    LoadingFirstPage,
    Ready,
    LoadingNextPage,
    /// The last fetch failed; see [`FeedSnapshot::last_error`].
    Error,
}

impl FeedPhase {
    /// True while a fetch is in flight.
    pub fn is_loading(self) -> bool {
        matches!(self, FeedPhase::LoadingFirstPage | FeedPhase::LoadingNextPage)
    }
}

/// Which fetch a [`FeedError`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedStage {
    FirstPage,
    /// A subsequent page. `page_no` is the page that failed, which is what a
    /// retry re-requests.
    NextPage { page_no: u32 },
}

impl fmt::Display for FailedStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailedStage::FirstPage => f.write_str("first page"),
            FailedStage::NextPage { page_no } => write!(f, "page {}", page_no),
        }
    }
}

/// A provider failure as recorded by the feed.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Loading {stage} failed: {source}")]
pub struct FeedError {
    pub stage: FailedStage,
    pub source: ProviderError,
}

impl FeedError {
    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }
}

/// Point-in-time copy of the feed, handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeedSnapshot {
    pub anchor: Option<QueryAnchor>,
    /// Accumulated results in page order, free of duplicate keys.
    pub items: Vec<SiteSummary>,
    /// Last page merged (or being loaded). Starts at 1.
    pub current_page: u32,
    /// Total reported by the most recent successful response.
    pub total_count: u32,
    pub can_load_more: bool,
    pub phase: FeedPhase,
    pub last_error: Option<FeedError>,
    /// Tag of the most recently issued fetch. Grows with every fetch.
    pub generation: u64,
}

impl FeedSnapshot {
    /// First-page load in progress.
    pub fn is_loading(&self) -> bool {
        self.phase == FeedPhase::LoadingFirstPage
    }

    /// Subsequent-page load in progress.
    pub fn is_loading_more(&self) -> bool {
        self.phase == FeedPhase::LoadingNextPage
    }

    /// Neither loading nor idle: the last fetch has either merged or failed.
    pub fn is_settled(&self) -> bool {
        matches!(self.phase, FeedPhase::Ready | FeedPhase::Error)
    }
}
