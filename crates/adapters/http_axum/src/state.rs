//! Shared application state for axum handlers.

use std::sync::Arc;

use twintank_app::control_cycle::ControlCycle;
use twintank_app::services::device_service::DeviceService;
use twintank_app::snapshot_bus::SnapshotBus;

/// The control cycle as wired behind the HTTP surface.
pub type Cycle<S> = ControlCycle<S, Arc<SnapshotBus>>;

/// Application state shared across all axum handlers.
///
/// Generic over the device store to avoid dynamic dispatch. `Clone` is
/// implemented manually so the store itself does not need to be `Clone`;
/// only the `Arc` wrappers are cloned.
pub struct AppState<S> {
    /// Orchestrator receiving pump and consumption commands.
    pub cycle: Arc<Cycle<S>>,
    /// Administrative device management.
    pub device_service: Arc<DeviceService<S>>,
    /// Latest snapshot and live snapshot feed.
    pub snapshots: Arc<SnapshotBus>,
    /// Dashboard auto-refresh interval.
    pub refresh_seconds: u32,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            cycle: Arc::clone(&self.cycle),
            device_service: Arc::clone(&self.device_service),
            snapshots: Arc::clone(&self.snapshots),
            refresh_seconds: self.refresh_seconds,
        }
    }
}

impl<S> AppState<S> {
    /// Create a new application state from pre-wrapped `Arc` services.
    ///
    /// The cycle and the bus are shared with the background timer, hence
    /// the `Arc`s.
    pub fn new(
        cycle: Arc<Cycle<S>>,
        device_service: Arc<DeviceService<S>>,
        snapshots: Arc<SnapshotBus>,
    ) -> Self {
        Self {
            cycle,
            device_service,
            snapshots,
            refresh_seconds: 5,
        }
    }

    /// Override the dashboard refresh interval.
    #[must_use]
    pub fn with_refresh_seconds(mut self, refresh_seconds: u32) -> Self {
        self.refresh_seconds = refresh_seconds;
        self
    }
}
