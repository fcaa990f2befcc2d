//! Sources of the device's current position.
//!
//! A location source is best effort: it may never produce a fix (no
//! permission, no hardware), and fixes may arrive late or repeat. The feed
//! runner treats each fix as a potential anchor change.

use crate::site::Coordinate;
use std::future::Future;
use tokio::sync::mpsc;

/// Asynchronous stream of location fixes.
pub trait LocationSource: Send + 'static {
    /// Wait for the next fix.
    ///
    /// Returns `None` once the source is exhausted; callers stop polling
    /// after that. Must be cancel safe, since it is raced in `select!`.
    fn next_fix(&mut self) -> impl Future<Output = Option<Coordinate>> + Send;
}

/// Yields a single fix, then nothing.
#[derive(Debug, Clone, Default)]
pub struct FixedLocation {
    fix: Option<Coordinate>,
}

impl FixedLocation {
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            fix: Some(coordinate),
        }
    }

    /// A source that never produces a fix, as when location permission is
    /// denied.
    pub fn unavailable() -> Self {
        Self { fix: None }
    }
}

impl LocationSource for FixedLocation {
    async fn next_fix(&mut self) -> Option<Coordinate> {
        self.fix.take()
    }
}

/// Fixes pushed from elsewhere in the program through a channel.
#[derive(Debug)]
pub struct ChannelLocation {
    rx: mpsc::Receiver<Coordinate>,
}

impl ChannelLocation {
    /// Returns the sending half alongside the source. Dropping every sender
    /// exhausts the source.
    pub fn new(buffer: usize) -> (mpsc::Sender<Coordinate>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, Self { rx })
    }
}

impl LocationSource for ChannelLocation {
    async fn next_fix(&mut self) -> Option<Coordinate> {
        self.rx.recv().await
    }
}
