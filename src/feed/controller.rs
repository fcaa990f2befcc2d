//! The feed state machine.
//!
//! [`FeedController`] owns the pagination cursor, the accumulated results and
//! the load-more policy. Fetches run on spawned tasks and report back through
//! a [`FeedEvent`] channel; the owner feeds those events into
//! [`FeedController::handle_event`]. Each fetch is tagged with a generation
//! number and completions for anything but the latest fetch are dropped, so
//! responses may arrive in any order.
//!
//! Transitions:
//!
//! - `Idle`/`Error`/any state → `LoadingFirstPage` on a new anchor or refresh
//! - `LoadingFirstPage` → `Ready` or `Error`
//! - `Ready` → `LoadingNextPage` on a near-end signal passing the guard
//! - `LoadingNextPage` → `Ready` (merged) or `Error` (earlier pages kept)

use super::merge::{can_load_more, SiteList};
use super::state::{FailedStage, FeedError, FeedPhase, FeedSnapshot};
use crate::config::Config;
use crate::provider::{fetch_page, ProviderError, SiteSearchProvider};
use crate::site::{ContentType, Coordinate, QueryAnchor, SitePage, SiteSummary};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Capacity of the event channel between fetch tasks and the controller.
const EVENT_BUFFER: usize = 16;

/// Completion of a fetch task.
#[derive(Debug)]
pub enum FeedEvent {
    PageLoaded {
        generation: u64,
        page_no: u32,
        result: Result<SitePage, ProviderError>,
    },
}

/// Tunables for a controller.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedOptions {
    /// Rows requested per page.
    pub page_size: u32,
    /// Radius of anchors built from location fixes.
    pub location_radius_meters: u32,
    /// Category filter of anchors built from location fixes.
    pub location_category: Option<ContentType>,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            page_size: 10,
            location_radius_meters: 2_000,
            location_category: None,
        }
    }
}

impl FeedOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            page_size: config.page_size,
            location_radius_meters: config.default_radius_meters,
            location_category: None,
        }
    }
}

/// Paginated, deduplicating site feed over a [`SiteSearchProvider`].
///
/// Must be used from within a Tokio runtime; fetches are spawned tasks.
pub struct FeedController<P> {
    provider: Arc<P>,
    options: FeedOptions,

    anchor: Option<QueryAnchor>,
    /// Set once the user picks an anchor; location fixes are ignored while set.
    user_anchored: bool,

    list: SiteList,
    current_page: u32,
    total_count: u32,
    can_load_more: bool,
    phase: FeedPhase,
    last_error: Option<FeedError>,

    generation: u64,
    fetch_handle: Option<JoinHandle<()>>,
    event_tx: mpsc::Sender<FeedEvent>,
    snapshot_tx: watch::Sender<FeedSnapshot>,
}

impl<P: SiteSearchProvider> FeedController<P> {
    /// Create an idle controller.
    ///
    /// Returns the receiving end of the event channel. Every event read from
    /// it must be passed to [`handle_event`](Self::handle_event).
    pub fn new(provider: Arc<P>, options: FeedOptions) -> (Self, mpsc::Receiver<FeedEvent>) {
        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
        let initial = FeedSnapshot {
            current_page: 1,
            ..FeedSnapshot::default()
        };
        let (snapshot_tx, _) = watch::channel(initial);

        let controller = Self {
            provider,
            options,
            anchor: None,
            user_anchored: false,
            list: SiteList::new(),
            current_page: 1,
            total_count: 0,
            can_load_more: false,
            phase: FeedPhase::Idle,
            last_error: None,
            generation: 0,
            fetch_handle: None,
            event_tx,
            snapshot_tx,
        };
        (controller, event_rx)
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn phase(&self) -> FeedPhase {
        self.phase
    }

    pub fn anchor(&self) -> Option<&QueryAnchor> {
        self.anchor.as_ref()
    }

    pub fn items(&self) -> &[SiteSummary] {
        self.list.items()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_user_anchored(&self) -> bool {
        self.user_anchored
    }

    /// Current state, copied.
    pub fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            anchor: self.anchor.clone(),
            items: self.list.items().to_vec(),
            current_page: self.current_page,
            total_count: self.total_count,
            can_load_more: self.can_load_more,
            phase: self.phase,
            last_error: self.last_error.clone(),
            generation: self.generation,
        }
    }

    /// Receiver that observes a new snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.snapshot_tx.subscribe()
    }

    // ------------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------------

    /// Make `anchor` the user's choice and load its first page.
    ///
    /// Passing the anchor already in effect does nothing unless the feed is
    /// idle or failed. A different anchor always wins, superseding any fetch
    /// in flight. Returns whether a fetch was started.
    pub fn set_anchor(&mut self, anchor: QueryAnchor) -> bool {
        self.user_anchored = true;
        self.apply_anchor(anchor)
    }

    /// Reload the current anchor from page 1, even if nothing changed.
    /// No-op when no anchor has been set.
    pub fn refresh(&mut self) -> bool {
        if self.anchor.is_none() {
            tracing::debug!("Refresh requested with no anchor, ignoring");
            return false;
        }
        tracing::debug!("Refreshing feed");
        self.reset_and_fetch();
        true
    }

    /// Near-end signal from the presentation layer.
    ///
    /// Loads the next page only when the feed is `Ready`, more data is
    /// expected, and the accumulated count is below the reported total.
    pub fn request_more_if_needed(&mut self, visible_index: usize) -> bool {
        let accumulated = self.list.len();
        if self.phase != FeedPhase::Ready
            || !self.can_load_more
            || accumulated == 0
            || accumulated >= self.total_count as usize
        {
            tracing::trace!(
                visible_index,
                phase = ?self.phase,
                can_load_more = self.can_load_more,
                accumulated,
                total_count = self.total_count,
                "Load more not needed"
            );
            return false;
        }

        self.current_page += 1;
        self.phase = FeedPhase::LoadingNextPage;
        tracing::debug!(visible_index, page_no = self.current_page, "Loading next page");
        self.spawn_fetch(self.current_page);
        self.publish();
        true
    }

    /// Re-request the page whose load failed. Only valid in `Error` after a
    /// subsequent-page failure; first-page failures are retried with
    /// [`refresh`](Self::refresh).
    pub fn retry_next_page(&mut self) -> bool {
        let page_no = match (&self.phase, &self.last_error) {
            (
                FeedPhase::Error,
                Some(FeedError {
                    stage: FailedStage::NextPage { page_no },
                    ..
                }),
            ) => *page_no,
            _ => {
                tracing::debug!(phase = ?self.phase, "Nothing to retry");
                return false;
            }
        };

        self.current_page = page_no;
        self.last_error = None;
        self.phase = FeedPhase::LoadingNextPage;
        tracing::debug!(page_no, "Retrying page");
        self.spawn_fetch(page_no);
        self.publish();
        true
    }

    /// A new position from the location source. Becomes the anchor unless
    /// the user has chosen one.
    pub fn on_location_fix(&mut self, coordinate: Coordinate) -> bool {
        if self.user_anchored {
            tracing::debug!(%coordinate, "Ignoring location fix (user anchor set)");
            return false;
        }
        let anchor = QueryAnchor::location(coordinate, self.options.location_radius_meters)
            .with_category(self.options.location_category);
        self.apply_anchor(anchor)
    }

    /// Let location fixes drive the anchor again. The current anchor and
    /// results stay until the next fix arrives.
    pub fn clear_user_anchor(&mut self) {
        self.user_anchored = false;
    }

    /// Apply a fetch completion. Returns `false` for stale completions,
    /// which are dropped.
    pub fn handle_event(&mut self, event: FeedEvent) -> bool {
        let FeedEvent::PageLoaded {
            generation,
            page_no,
            result,
        } = event;

        if generation != self.generation || !self.phase.is_loading() {
            tracing::debug!(
                expected = self.generation,
                got = generation,
                page_no,
                "Ignoring stale page response (generation mismatch)"
            );
            return false;
        }
        self.fetch_handle = None;

        match result {
            Ok(page) => self.merge_page(page_no, page),
            Err(e) => self.record_failure(page_no, e),
        }
        self.publish();
        true
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn apply_anchor(&mut self, anchor: QueryAnchor) -> bool {
        let unchanged = self.anchor.as_ref() == Some(&anchor);
        if unchanged && !matches!(self.phase, FeedPhase::Idle | FeedPhase::Error) {
            tracing::debug!(%anchor, phase = ?self.phase, "Anchor unchanged, ignoring");
            return false;
        }

        tracing::debug!(%anchor, "Anchor set");
        self.anchor = Some(anchor);
        self.reset_and_fetch();
        true
    }

    fn reset_and_fetch(&mut self) {
        self.list.clear();
        self.current_page = 1;
        self.total_count = 0;
        self.can_load_more = true;
        self.last_error = None;
        self.phase = FeedPhase::LoadingFirstPage;
        self.spawn_fetch(1);
        self.publish();
    }

    fn merge_page(&mut self, page_no: u32, page: SitePage) {
        if page.page_no != page_no {
            tracing::warn!(
                requested = page_no,
                reported = page.page_no,
                "Provider reported a different page number"
            );
        }

        let page_len = page.items.len();
        let outcome = if self.phase == FeedPhase::LoadingFirstPage {
            self.list.replace(page.items)
        } else {
            self.list.append(page.items)
        };

        self.total_count = page.total_count;
        self.can_load_more = can_load_more(
            page_len,
            self.list.len(),
            self.total_count,
            self.options.page_size,
        );
        self.current_page = page_no;
        self.phase = FeedPhase::Ready;

        tracing::debug!(
            page_no,
            kept = outcome.kept,
            duplicates = outcome.duplicates,
            accumulated = self.list.len(),
            total_count = self.total_count,
            can_load_more = self.can_load_more,
            "Page merged"
        );
    }

    fn record_failure(&mut self, page_no: u32, error: ProviderError) {
        let stage = if self.phase == FeedPhase::LoadingFirstPage {
            self.list.clear();
            self.can_load_more = false;
            FailedStage::FirstPage
        } else {
            // The cursor stays on the last page that merged
            self.current_page = page_no.saturating_sub(1).max(1);
            FailedStage::NextPage { page_no }
        };

        tracing::warn!(
            page_no,
            kind = ?error.kind(),
            error = %error,
            "Page load failed"
        );
        self.last_error = Some(FeedError {
            stage,
            source: error,
        });
        self.phase = FeedPhase::Error;
    }

    fn spawn_fetch(&mut self, page_no: u32) {
        let Some(anchor) = self.anchor.clone() else {
            return;
        };

        if let Some(handle) = self.fetch_handle.take() {
            handle.abort();
            tracing::debug!("Aborted previous fetch task");
        }

        self.generation = self.generation.wrapping_add(1);
        let generation = self.generation;
        let provider = Arc::clone(&self.provider);
        let tx = self.event_tx.clone();
        let page_size = self.options.page_size;

        tracing::debug!(%anchor, page_no, generation, "Spawning page fetch");

        self.fetch_handle = Some(tokio::spawn(async move {
            let result = fetch_page(provider.as_ref(), &anchor, page_no, page_size).await;
            let event = FeedEvent::PageLoaded {
                generation,
                page_no,
                result,
            };
            if let Err(e) = tx.send(event).await {
                tracing::warn!(error = %e, "Failed to deliver page (receiver dropped)");
            }
        }));
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }
}

impl<P> Drop for FeedController<P> {
    fn drop(&mut self) {
        if let Some(handle) = self.fetch_handle.take() {
            handle.abort();
        }
    }
}
