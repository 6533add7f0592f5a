//! Rendering port: where finished snapshots are pushed.

use std::future::Future;

use twintank_domain::error::TwinTankError;
use twintank_domain::snapshot::Snapshot;

/// Receives a fresh [`Snapshot`] after every completed cycle.
///
/// Surfaces redraw from the snapshot alone, so a dropped snapshot is
/// repaired by the next one.
pub trait SnapshotPublisher: Send + Sync {
    fn publish(&self, snapshot: Snapshot) -> impl Future<Output = Result<(), TwinTankError>> + Send;
}

impl<T: SnapshotPublisher> SnapshotPublisher for std::sync::Arc<T> {
    fn publish(
        &self,
        snapshot: Snapshot,
    ) -> impl Future<Output = Result<(), TwinTankError>> + Send {
        (**self).publish(snapshot)
    }
}
