//! Timer that drives the control cycle in the background.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::control_cycle::{ControlCycle, CycleOutcome};
use crate::ports::{DeviceStore, SnapshotPublisher};

/// Fires a cycle every `period` until aborted.
pub struct CycleTimer<S, P> {
    cycle: Arc<ControlCycle<S, P>>,
    period: Duration,
}

impl<S, P> CycleTimer<S, P>
where
    S: DeviceStore + 'static,
    P: SnapshotPublisher + 'static,
{
    /// Spawn the timer loop. Abort the returned handle to stop it.
    pub fn start(cycle: Arc<ControlCycle<S, P>>, period: Duration) -> JoinHandle<()> {
        let timer = Self { cycle, period };
        tracing::info!(period = ?timer.period, "control cycle timer started");
        tokio::spawn(timer.run())
    }

    async fn run(self) {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            match self.cycle.tick().await {
                CycleOutcome::Completed(snapshot) => {
                    tracing::debug!(alerts = snapshot.alerts.len(), "cycle completed");
                }
                CycleOutcome::Skipped => {}
                CycleOutcome::Aborted(err) => {
                    tracing::debug!(%err, "cycle aborted, waiting for next tick");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control_cycle::CycleSettings;
    use crate::snapshot_bus::SnapshotBus;
    use crate::testing::FakeStore;

    #[tokio::test]
    async fn should_publish_snapshots_on_every_period() {
        let store = Arc::new(FakeStore::installation(false, true, 50, 10));
        let bus = Arc::new(SnapshotBus::new(8));
        let mut rx = bus.subscribe();
        let cycle = Arc::new(ControlCycle::new(
            Arc::clone(&store),
            Arc::clone(&bus),
            CycleSettings::default(),
        ));

        let handle = CycleTimer::start(cycle, Duration::from_millis(10));
        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        handle.abort();

        let backup = |s: &twintank_domain::snapshot::Snapshot| {
            s.by_role(twintank_domain::roles::Role::BackupSensor)
                .unwrap()
                .device
                .level
                .percent()
        };
        assert_eq!(backup(&first), 20);
        assert_eq!(backup(&second), 30);
    }

    #[tokio::test]
    async fn should_stop_when_aborted() {
        let store = Arc::new(FakeStore::installation(false, false, 50, 50));
        let cycle = Arc::new(ControlCycle::new(
            store,
            Arc::new(SnapshotBus::new(1)),
            CycleSettings::default(),
        ));
        let handle = CycleTimer::start(cycle, Duration::from_secs(3600));
        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
    }
}
