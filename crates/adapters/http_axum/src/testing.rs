//! Test fixtures shared by the handler tests.

use std::future::Future;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use twintank_app::control_cycle::{ControlCycle, CycleSettings};
use twintank_app::ports::{DeviceStore, Inventory};
use twintank_app::services::device_service::DeviceService;
use twintank_app::snapshot_bus::SnapshotBus;
use twintank_domain::device::{Device, DevicePatch, Level, NewDevice};
use twintank_domain::error::{NotFoundError, TwinTankError};
use twintank_domain::history::HistoryEntry;
use twintank_domain::id::DeviceId;
use twintank_domain::roles::Role;
use twintank_domain::time;

use crate::state::AppState;

/// Store holding a four-device installation in a mutex.
#[derive(Default)]
pub struct StubStore {
    pub inventory: Mutex<Inventory>,
}

impl StubStore {
    pub fn installation() -> Self {
        let at = time::from_unix(1_000);
        let device = |id: &str, name: &str, role: Role, state: bool, level: i64| {
            Device::builder()
                .id(id)
                .name(name)
                .role(role)
                .state(state)
                .level(Level::new(level))
                .last_event_at(at)
                .build()
                .unwrap()
        };
        let store = Self::default();
        store.inventory.lock().unwrap().devices = vec![
            device("1", "Main pump", Role::MainPump, false, 0),
            device("2", "Backup pump", Role::BackupPump, false, 0),
            device("3", "Main tank", Role::MainSensor, false, 28),
            device("4", "Backup tank", Role::BackupSensor, false, 60),
        ];
        store
    }

    pub fn device(&self, id: &str) -> Option<Device> {
        self.inventory
            .lock()
            .unwrap()
            .devices
            .iter()
            .find(|d| d.id.as_str() == id)
            .cloned()
    }

    fn not_found(id: &DeviceId) -> TwinTankError {
        NotFoundError {
            entity: "Device",
            id: id.to_string(),
        }
        .into()
    }
}

impl DeviceStore for StubStore {
    fn list_all(&self) -> impl Future<Output = Result<Inventory, TwinTankError>> + Send {
        let inventory = self.inventory.lock().unwrap().clone();
        async move { Ok(inventory) }
    }

    fn create_device(
        &self,
        device: NewDevice,
    ) -> impl Future<Output = Result<Device, TwinTankError>> + Send {
        let result = Device::builder()
            .id("new")
            .name(device.name)
            .kind(device.kind)
            .role(device.role)
            .build();
        if let Ok(created) = &result {
            self.inventory.lock().unwrap().devices.push(created.clone());
        }
        async move { result }
    }

    fn update_device(
        &self,
        id: DeviceId,
        patch: DevicePatch,
    ) -> impl Future<Output = Result<(), TwinTankError>> + Send {
        let mut inventory = self.inventory.lock().unwrap();
        let result = match inventory.devices.iter_mut().find(|d| d.id == id) {
            Some(device) => {
                device.apply(&patch);
                Ok(())
            }
            None => Err(Self::not_found(&id)),
        };
        async move { result }
    }

    fn append_log(
        &self,
        entry: HistoryEntry,
    ) -> impl Future<Output = Result<HistoryEntry, TwinTankError>> + Send {
        self.inventory.lock().unwrap().history.push(entry.clone());
        async move { Ok(entry) }
    }

    fn delete_device(
        &self,
        id: DeviceId,
    ) -> impl Future<Output = Result<(), TwinTankError>> + Send {
        let mut inventory = self.inventory.lock().unwrap();
        let before = inventory.devices.len();
        inventory.devices.retain(|d| d.id != id);
        let result = if inventory.devices.len() == before {
            Err(Self::not_found(&id))
        } else {
            Ok(())
        };
        async move { result }
    }
}

pub fn test_state() -> (AppState<Arc<StubStore>>, Arc<StubStore>) {
    let store = Arc::new(StubStore::installation());
    let bus = Arc::new(SnapshotBus::new(8));
    let cycle = Arc::new(ControlCycle::new(
        Arc::clone(&store),
        Arc::clone(&bus),
        CycleSettings::default(),
    ));
    let service = Arc::new(DeviceService::new(Arc::clone(&store)));
    (AppState::new(cycle, service, bus), store)
}

pub async fn read_body(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn read_json(response: Response) -> serde_json::Value {
    serde_json::from_str(&read_body(response).await).unwrap()
}
