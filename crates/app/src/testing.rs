//! Test doubles shared by the service and orchestrator tests.

use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use twintank_domain::device::{Device, DevicePatch, Level, NewDevice};
use twintank_domain::error::{NotFoundError, TwinTankError};
use twintank_domain::history::HistoryEntry;
use twintank_domain::id::DeviceId;
use twintank_domain::roles::Role;

use crate::ports::{DeviceStore, Inventory};

/// Store kept in a mutex, with a switch to simulate an outage.
#[derive(Default)]
pub struct FakeStore {
    pub inventory: Mutex<Inventory>,
    pub offline: AtomicBool,
    pub stalled: AtomicBool,
    /// Delay the answer of the next `list_all`; the inventory is read
    /// before the delay.
    pub slow_next_list: AtomicBool,
    /// Device whose updates fail as if the store were down.
    pub failing_device: Mutex<Option<DeviceId>>,
    pub updates: AtomicUsize,
    next_id: AtomicUsize,
}

impl FakeStore {
    pub fn with_devices(devices: Vec<Device>) -> Self {
        let store = Self::default();
        store.inventory.lock().unwrap().devices = devices;
        store
    }

    /// Main pump, backup pump, main tank, backup tank with ids 1 to 4.
    pub fn installation(main_on: bool, backup_on: bool, main: i64, backup: i64) -> Self {
        let at = twintank_domain::time::from_unix(1_000);
        Self::with_devices(vec![
            Device::builder()
                .id("1")
                .name("Main pump")
                .role(Role::MainPump)
                .state(main_on)
                .last_event_at(at)
                .build()
                .unwrap(),
            Device::builder()
                .id("2")
                .name("Backup pump")
                .role(Role::BackupPump)
                .state(backup_on)
                .last_event_at(at)
                .build()
                .unwrap(),
            Device::builder()
                .id("3")
                .name("Main tank")
                .role(Role::MainSensor)
                .level(Level::new(main))
                .last_event_at(at)
                .build()
                .unwrap(),
            Device::builder()
                .id("4")
                .name("Backup tank")
                .role(Role::BackupSensor)
                .level(Level::new(backup))
                .last_event_at(at)
                .build()
                .unwrap(),
        ])
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn device(&self, id: &str) -> Device {
        self.inventory
            .lock()
            .unwrap()
            .devices
            .iter()
            .find(|d| d.id.as_str() == id)
            .cloned()
            .unwrap()
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.inventory.lock().unwrap().history.clone()
    }

    pub fn history_events(&self) -> Vec<String> {
        self.history().into_iter().map(|e| e.event).collect()
    }

    fn check_online(&self) -> Result<(), TwinTankError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(TwinTankError::store(std::io::Error::other("store offline")))
        } else {
            Ok(())
        }
    }

    fn fresh_id(&self) -> DeviceId {
        DeviceId::new(format!("x{}", self.next_id.fetch_add(1, Ordering::SeqCst)))
    }
}

impl DeviceStore for FakeStore {
    fn list_all(&self) -> impl Future<Output = Result<Inventory, TwinTankError>> + Send {
        let result = self
            .check_online()
            .map(|()| self.inventory.lock().unwrap().clone());
        let stalled = self.stalled.load(Ordering::SeqCst);
        let slow = self.slow_next_list.swap(false, Ordering::SeqCst);
        async move {
            if stalled {
                std::future::pending::<()>().await;
            }
            if slow {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            result
        }
    }

    fn create_device(
        &self,
        device: NewDevice,
    ) -> impl Future<Output = Result<Device, TwinTankError>> + Send {
        let result = self.check_online().and_then(|()| {
            let created = Device::builder()
                .id(self.fresh_id())
                .name(device.name)
                .kind(device.kind)
                .role(device.role)
                .last_event(twintank_domain::device::EVENT_DEVICE_CREATED)
                .build()?;
            self.inventory.lock().unwrap().devices.push(created.clone());
            Ok(created)
        });
        async move { result }
    }

    fn update_device(
        &self,
        id: DeviceId,
        patch: DevicePatch,
    ) -> impl Future<Output = Result<(), TwinTankError>> + Send {
        let result = self.check_online().and_then(|()| {
            if self.failing_device.lock().unwrap().as_ref() == Some(&id) {
                return Err(TwinTankError::store(std::io::Error::other("write rejected")));
            }
            let mut inventory = self.inventory.lock().unwrap();
            let device = inventory
                .devices
                .iter_mut()
                .find(|d| d.id == id)
                .ok_or_else(|| NotFoundError {
                    entity: "Device",
                    id: id.to_string(),
                })?;
            device.apply(&patch);
            self.updates.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        async move { result }
    }

    fn append_log(
        &self,
        mut entry: HistoryEntry,
    ) -> impl Future<Output = Result<HistoryEntry, TwinTankError>> + Send {
        let result = self.check_online().map(|()| {
            entry.id = Some(self.fresh_id());
            self.inventory.lock().unwrap().history.push(entry.clone());
            entry
        });
        async move { result }
    }

    fn delete_device(
        &self,
        id: DeviceId,
    ) -> impl Future<Output = Result<(), TwinTankError>> + Send {
        let result = self.check_online().and_then(|()| {
            let mut inventory = self.inventory.lock().unwrap();
            let before = inventory.devices.len();
            inventory.devices.retain(|d| d.id != id);
            if inventory.devices.len() == before {
                Err(NotFoundError {
                    entity: "Device",
                    id: id.to_string(),
                }
                .into())
            } else {
                Ok(())
            }
        });
        async move { result }
    }
}
