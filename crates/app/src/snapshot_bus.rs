//! In-process snapshot bus backed by a tokio broadcast channel.

use std::future::Future;
use std::sync::{PoisonError, RwLock};

use tokio::sync::broadcast;

use twintank_domain::error::TwinTankError;
use twintank_domain::snapshot::Snapshot;

use crate::ports::SnapshotPublisher;

/// Fans snapshots out to live subscribers and keeps the latest one for
/// late readers.
///
/// Publishing succeeds even when there are no active subscribers.
pub struct SnapshotBus {
    sender: broadcast::Sender<Snapshot>,
    latest: RwLock<Option<Snapshot>>,
}

impl SnapshotBus {
    /// Create a new bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            latest: RwLock::new(None),
        }
    }

    /// Subscribe to snapshots published *after* this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Snapshot> {
        self.sender.subscribe()
    }

    /// The most recently published snapshot, if any cycle completed yet.
    #[must_use]
    pub fn latest(&self) -> Option<Snapshot> {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SnapshotPublisher for SnapshotBus {
    fn publish(
        &self,
        snapshot: Snapshot,
    ) -> impl Future<Output = Result<(), TwinTankError>> + Send {
        *self.latest.write().unwrap_or_else(PoisonError::into_inner) = Some(snapshot.clone());
        // Fails only when nobody listens.
        let _ = self.sender.send(snapshot);
        async { Ok(()) }
    }
}
