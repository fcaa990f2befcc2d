//! Runs a [`FeedController`] on its own task.
//!
//! The loop multiplexes three sources with `tokio::select!`:
//!
//! - **Commands** from the presentation layer ([`FeedCommand`])
//! - **Fetch completions** from the controller's spawned tasks
//! - **Location fixes** from a [`LocationSource`]
//!
//! State leaves the task through the controller's `watch` channel, so a
//! [`FeedHandle`] offers both a synchronous snapshot and change notification.

use super::controller::{FeedController, FeedEvent};
use super::state::FeedSnapshot;
use crate::location::LocationSource;
use crate::provider::SiteSearchProvider;
use crate::site::QueryAnchor;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

const COMMAND_BUFFER: usize = 32;

/// Requests accepted by a running feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedCommand {
    SetAnchor(QueryAnchor),
    Refresh,
    /// Row at this index became visible near the end of the list.
    NearEnd(usize),
    RetryNextPage,
    /// Hand the anchor back to location fixes.
    ClearUserAnchor,
    Shutdown,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Feed task has stopped")]
pub struct FeedClosed;

/// Owner-side handle of a running feed.
pub struct FeedHandle {
    commands: mpsc::Sender<FeedCommand>,
    snapshots: watch::Receiver<FeedSnapshot>,
    task: JoinHandle<()>,
}

impl FeedHandle {
    pub async fn send(&self, command: FeedCommand) -> Result<(), FeedClosed> {
        self.commands.send(command).await.map_err(|_| FeedClosed)
    }

    /// Latest published state.
    pub fn snapshot(&self) -> FeedSnapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver for change notifications. Each receiver tracks which
    /// snapshots it has seen independently.
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.snapshots.clone()
    }

    /// Wait until a snapshot satisfies `predicate`, checking the current one
    /// first.
    pub async fn wait_for(
        &mut self,
        predicate: impl FnMut(&FeedSnapshot) -> bool,
    ) -> Result<FeedSnapshot, FeedClosed> {
        self.snapshots
            .wait_for(predicate)
            .await
            .map(|snapshot| snapshot.clone())
            .map_err(|_| FeedClosed)
    }

    /// Stop the loop and wait for it to exit.
    pub async fn shutdown(self) {
        if self.commands.send(FeedCommand::Shutdown).await.is_err() {
            tracing::debug!("Feed task already stopped");
        }
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Feed task failed");
        }
    }
}

/// Start the feed loop.
///
/// `events` is the receiver returned by [`FeedController::new`].
pub fn spawn_feed<P, L>(
    controller: FeedController<P>,
    events: mpsc::Receiver<FeedEvent>,
    location: L,
) -> FeedHandle
where
    P: SiteSearchProvider,
    L: LocationSource,
{
    let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
    let snapshots = controller.subscribe();
    let task = tokio::spawn(run_feed(controller, events, commands_rx, location));

    FeedHandle {
        commands: commands_tx,
        snapshots,
        task,
    }
}

async fn run_feed<P, L>(
    mut controller: FeedController<P>,
    mut events: mpsc::Receiver<FeedEvent>,
    mut commands: mpsc::Receiver<FeedCommand>,
    mut location: L,
) where
    P: SiteSearchProvider,
    L: LocationSource,
{
    let mut location_open = true;

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(FeedCommand::Shutdown) | None => break,
                Some(command) => apply_command(&mut controller, command),
            },

            Some(event) = events.recv() => {
                controller.handle_event(event);
            }

            fix = location.next_fix(), if location_open => match fix {
                Some(coordinate) => {
                    controller.on_location_fix(coordinate);
                }
                None => {
                    tracing::debug!("Location source exhausted");
                    location_open = false;
                }
            },
        }
    }

    tracing::debug!("Feed loop exiting");
}

fn apply_command<P: SiteSearchProvider>(controller: &mut FeedController<P>, command: FeedCommand) {
    tracing::trace!(?command, "Feed command");
    match command {
        FeedCommand::SetAnchor(anchor) => {
            controller.set_anchor(anchor);
        }
        FeedCommand::Refresh => {
            controller.refresh();
        }
        FeedCommand::NearEnd(index) => {
            controller.request_more_if_needed(index);
        }
        FeedCommand::RetryNextPage => {
            controller.retry_next_page();
        }
        FeedCommand::ClearUserAnchor => controller.clear_user_anchor(),
        FeedCommand::Shutdown => {}
    }
}
