//! Paginated site feed.
//!
//! The feed turns a remote paged search into one growing, duplicate-free
//! list suitable for infinite scroll:
//!
//! - [`state`] - phases, errors and the snapshot handed to observers
//! - [`merge`] - page accumulation with duplicate suppression
//! - [`controller`] - the state machine and its stale-response guard
//! - [`runner`] - a task that drives a controller from commands and
//!   location fixes
//!
//! # Example
//!
//! ```ignore
//! use tripfeed::feed::{spawn_feed, FeedCommand, FeedController, FeedOptions};
//!
//! let (controller, events) = FeedController::new(provider, FeedOptions::default());
//! let mut feed = spawn_feed(controller, events, FixedLocation::unavailable());
//! feed.send(FeedCommand::SetAnchor(QueryAnchor::keyword("palace"))).await?;
//! let snapshot = feed.wait_for(|s| s.is_settled()).await?;
//! ```

pub mod controller;
pub mod merge;
pub mod runner;
pub mod state;

pub use controller::{FeedController, FeedEvent, FeedOptions};
pub use merge::{MergeOutcome, SiteList};
pub use runner::{spawn_feed, FeedClosed, FeedCommand, FeedHandle};
pub use state::{FailedStage, FeedError, FeedPhase, FeedSnapshot};
