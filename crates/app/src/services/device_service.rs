//! Device service: administrative use-cases for the device collection.

use twintank_domain::device::{Device, NewDevice};
use twintank_domain::error::{NotFoundError, TwinTankError};
use twintank_domain::id::DeviceId;
use twintank_domain::roles::Role;

use crate::ports::DeviceStore;

/// Application service for registering, listing and removing devices.
pub struct DeviceService<S> {
    store: S,
}

impl<S: DeviceStore> DeviceService<S> {
    /// Create a new service backed by the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Register a new device after validating domain invariants.
    ///
    /// Registering a second device for an already taken role is allowed,
    /// but leaves that role unresolved until one of them is removed.
    ///
    /// # Errors
    ///
    /// Returns [`TwinTankError::Validation`] if invariants fail, or a
    /// store error propagated from the adapter.
    #[tracing::instrument(
        skip(self, device),
        fields(device_name = %device.name, role = %device.role)
    )]
    pub async fn create_device(&self, device: NewDevice) -> Result<Device, TwinTankError> {
        device.validate()?;
        if device.role != Role::Other {
            let existing = self.store.list_devices().await?;
            if existing.iter().any(|d| d.role == device.role) {
                tracing::warn!(
                    "role already taken, it stays unresolved until one device is removed"
                );
            }
        }
        let created = self.store.create_device(device).await?;
        tracing::info!(id = %created.id, "device registered");
        Ok(created)
    }

    /// Look up a device by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`TwinTankError::NotFound`] when no device with `id` exists,
    /// or a store error from the adapter.
    #[tracing::instrument(skip(self))]
    pub async fn get_device(&self, id: &DeviceId) -> Result<Device, TwinTankError> {
        self.store
            .list_devices()
            .await?
            .into_iter()
            .find(|d| d.id == *id)
            .ok_or_else(|| {
                NotFoundError {
                    entity: "Device",
                    id: id.to_string(),
                }
                .into()
            })
    }

    /// List every device, history rows excluded.
    ///
    /// # Errors
    ///
    /// Returns a store error propagated from the adapter.
    pub async fn list_devices(&self) -> Result<Vec<Device>, TwinTankError> {
        self.store.list_devices().await
    }

    /// Delete a device by id.
    ///
    /// # Errors
    ///
    /// Returns [`TwinTankError::NotFound`] for an unknown id, or a store
    /// error propagated from the adapter.
    #[tracing::instrument(skip(self))]
    pub async fn delete_device(&self, id: DeviceId) -> Result<(), TwinTankError> {
        self.store.delete_device(id).await
    }
}
