//! Device store port: the external collection holding devices and logs.

use std::future::Future;

use twintank_domain::device::{Device, DevicePatch, NewDevice};
use twintank_domain::error::TwinTankError;
use twintank_domain::history::HistoryEntry;
use twintank_domain::id::DeviceId;

/// Full content of the store, split by record kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    pub devices: Vec<Device>,
    pub history: Vec<HistoryEntry>,
}

/// Access to the device collection.
///
/// Transport failures, non-success answers and undecodable bodies are all
/// reported as [`TwinTankError::StoreUnavailable`].
pub trait DeviceStore: Send + Sync {
    /// Fetch every record in one call.
    fn list_all(&self) -> impl Future<Output = Result<Inventory, TwinTankError>> + Send;

    /// Fetch real devices only, dropping history rows.
    fn list_devices(&self) -> impl Future<Output = Result<Vec<Device>, TwinTankError>> + Send {
        async move { Ok(self.list_all().await?.devices) }
    }

    /// Register a new device; the store assigns its id.
    fn create_device(
        &self,
        device: NewDevice,
    ) -> impl Future<Output = Result<Device, TwinTankError>> + Send;

    /// Partially update a device. Only fields set in `patch` are sent.
    ///
    /// Returns [`TwinTankError::NotFound`] for an unknown id.
    fn update_device(
        &self,
        id: DeviceId,
        patch: DevicePatch,
    ) -> impl Future<Output = Result<(), TwinTankError>> + Send;

    /// Append a history record.
    fn append_log(
        &self,
        entry: HistoryEntry,
    ) -> impl Future<Output = Result<HistoryEntry, TwinTankError>> + Send;

    /// Remove a device. Administrative use only.
    fn delete_device(&self, id: DeviceId) -> impl Future<Output = Result<(), TwinTankError>> + Send;
}

impl<T: DeviceStore> DeviceStore for std::sync::Arc<T> {
    fn list_all(&self) -> impl Future<Output = Result<Inventory, TwinTankError>> + Send {
        (**self).list_all()
    }

    fn create_device(
        &self,
        device: NewDevice,
    ) -> impl Future<Output = Result<Device, TwinTankError>> + Send {
        (**self).create_device(device)
    }

    fn update_device(
        &self,
        id: DeviceId,
        patch: DevicePatch,
    ) -> impl Future<Output = Result<(), TwinTankError>> + Send {
        (**self).update_device(id, patch)
    }

    fn append_log(
        &self,
        entry: HistoryEntry,
    ) -> impl Future<Output = Result<HistoryEntry, TwinTankError>> + Send {
        (**self).append_log(entry)
    }

    fn delete_device(
        &self,
        id: DeviceId,
    ) -> impl Future<Output = Result<(), TwinTankError>> + Send {
        (**self).delete_device(id)
    }
}
