//! # twintank-adapter-store-memory
//!
//! Device store that lives in process memory. Used for demos and local
//! development when no remote collection is available.
//!
//! ## Seeded installation
//!
//! | Device | Kind | Role | Initial value |
//! |--------|------|------|---------------|
//! | `BombaDeAgua` | actuator | main pump | off |
//! | `BombaDeAgua Respaldo` | actuator | backup pump | off |
//! | `Tinaco Principal` | sensor | main sensor | 60% |
//! | `Tinaco Respaldo` | sensor | backup sensor | 80% |
//!
//! ## Dependency rule
//!
//! Depends on `twintank-app` (port traits) and `twintank-domain` only.

use std::future::Future;

use tokio::sync::RwLock;

use twintank_app::ports::{DeviceStore, Inventory};
use twintank_domain::device::{
    Device, DeviceKind, DevicePatch, EVENT_DEVICE_CREATED, Level, NewDevice,
};
use twintank_domain::error::{NotFoundError, TwinTankError};
use twintank_domain::history::HistoryEntry;
use twintank_domain::id::DeviceId;
use twintank_domain::roles::Role;
use twintank_domain::time;

/// Log entries kept before the oldest ones are dropped.
pub const DEFAULT_HISTORY_CAPACITY: usize = 500;

/// Devices and history kept behind a lock.
#[derive(Debug)]
pub struct InMemoryDeviceStore {
    inventory: RwLock<Inventory>,
    history_capacity: usize,
}

impl Default for InMemoryDeviceStore {
    fn default() -> Self {
        Self::with_devices(Vec::new())
    }
}

impl InMemoryDeviceStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding the four devices of the demo installation.
    #[must_use]
    pub fn with_demo_installation() -> Self {
        let at = time::now();
        let device = |name: &str, kind, role, level: i64| Device {
            id: DeviceId::random(),
            name: name.to_string(),
            kind,
            role,
            state: false,
            level: Level::new(level),
            last_event_at: at,
            last_event: EVENT_DEVICE_CREATED.to_string(),
        };
        Self::with_devices(vec![
            device("BombaDeAgua", DeviceKind::Actuator, Role::MainPump, 0),
            device("BombaDeAgua Respaldo", DeviceKind::Actuator, Role::BackupPump, 0),
            device("Tinaco Principal", DeviceKind::Sensor, Role::MainSensor, 60),
            device("Tinaco Respaldo", DeviceKind::Sensor, Role::BackupSensor, 80),
        ])
    }

    #[must_use]
    pub fn with_devices(devices: Vec<Device>) -> Self {
        Self {
            inventory: RwLock::new(Inventory {
                devices,
                history: Vec::new(),
            }),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }

    /// Keep at most `capacity` log entries, oldest dropped first.
    #[must_use]
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity.max(1);
        self
    }

    fn not_found(id: &DeviceId) -> TwinTankError {
        NotFoundError {
            entity: "Device",
            id: id.to_string(),
        }
        .into()
    }
}

impl DeviceStore for InMemoryDeviceStore {
    fn list_all(&self) -> impl Future<Output = Result<Inventory, TwinTankError>> + Send {
        async move { Ok(self.inventory.read().await.clone()) }
    }

    fn create_device(
        &self,
        device: NewDevice,
    ) -> impl Future<Output = Result<Device, TwinTankError>> + Send {
        async move {
            device.validate()?;
            let created = Device {
                id: DeviceId::random(),
                name: device.name,
                kind: device.kind,
                role: device.role,
                state: false,
                level: Level::EMPTY,
                last_event_at: time::now(),
                last_event: EVENT_DEVICE_CREATED.to_string(),
            };
            self.inventory.write().await.devices.push(created.clone());
            tracing::debug!(id = %created.id, "device stored in memory");
            Ok(created)
        }
    }

    fn update_device(
        &self,
        id: DeviceId,
        patch: DevicePatch,
    ) -> impl Future<Output = Result<(), TwinTankError>> + Send {
        async move {
            let mut inventory = self.inventory.write().await;
            let device = inventory
                .devices
                .iter_mut()
                .find(|d| d.id == id)
                .ok_or_else(|| Self::not_found(&id))?;
            device.apply(&patch);
            Ok(())
        }
    }

    fn append_log(
        &self,
        entry: HistoryEntry,
    ) -> impl Future<Output = Result<HistoryEntry, TwinTankError>> + Send {
        async move {
            let saved = HistoryEntry {
                id: Some(DeviceId::random()),
                ..entry
            };
            let mut inventory = self.inventory.write().await;
            inventory.history.push(saved.clone());
            let excess = inventory.history.len().saturating_sub(self.history_capacity);
            if excess > 0 {
                inventory.history.drain(..excess);
            }
            Ok(saved)
        }
    }

    fn delete_device(
        &self,
        id: DeviceId,
    ) -> impl Future<Output = Result<(), TwinTankError>> + Send {
        async move {
            let mut inventory = self.inventory.write().await;
            let before = inventory.devices.len();
            inventory.devices.retain(|d| d.id != id);
            if inventory.devices.len() == before {
                return Err(Self::not_found(&id));
            }
            Ok(())
        }
    }
}
