//! [`DeviceStore`] implementation over reqwest.

use std::future::Future;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use twintank_app::ports::{DeviceStore, Inventory};
use twintank_domain::device::{Device, DevicePatch, NewDevice};
use twintank_domain::error::{MalformedDevice, TwinTankError};
use twintank_domain::history::HistoryEntry;
use twintank_domain::id::DeviceId;
use twintank_domain::time;

use crate::config::RestStoreConfig;
use crate::error::RestStoreError;
use crate::record::{CreateBody, LogBody, PatchBody, Record, Row};

/// Device store backed by a JSON collection reachable over HTTP.
#[derive(Debug, Clone)]
pub struct RestDeviceStore {
    client: Client,
    config: RestStoreConfig,
}

impl RestDeviceStore {
    /// Build a store with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`RestStoreError::Client`] if the client cannot be built.
    pub fn new(config: RestStoreConfig) -> Result<Self, RestStoreError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(RestStoreError::Client)?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &RestStoreConfig {
        &self.config
    }

    async fn fetch_inventory(&self) -> Result<Inventory, RestStoreError> {
        let response = send(self.client.get(self.config.collection_url()), None).await?;
        let rows: Vec<Value> = read_json(response).await?;

        let mut inventory = Inventory::default();
        for raw in rows {
            match decode_row(raw) {
                Ok(Row::Device(device)) => inventory.devices.push(device),
                Ok(Row::Log(entry)) => inventory.history.push(entry),
                Err(err) => tracing::warn!(error = %err, "skipping malformed record"),
            }
        }
        tracing::trace!(
            devices = inventory.devices.len(),
            history = inventory.history.len(),
            "inventory fetched"
        );
        Ok(inventory)
    }

    async fn post_device(&self, device: &NewDevice) -> Result<Device, RestStoreError> {
        let body = CreateBody::new(device, time::now());
        let request = self.client.post(self.config.collection_url()).json(&body);
        let raw: Value = read_json(send(request, None).await?).await?;
        match decode_row(raw).map_err(RestStoreError::Malformed)? {
            Row::Device(created) => Ok(created),
            Row::Log(entry) => Err(RestStoreError::Malformed(MalformedDevice::UnknownKind {
                id: entry.id.map(|id| id.to_string()).unwrap_or_default(),
                kind: "log".to_string(),
            })),
        }
    }

    async fn put_patch(&self, id: &DeviceId, patch: &DevicePatch) -> Result<(), RestStoreError> {
        let request = self
            .client
            .put(self.config.item_url(id.as_str()))
            .json(&PatchBody::from(patch));
        send(request, Some(id)).await?;
        Ok(())
    }

    async fn post_log(&self, entry: HistoryEntry) -> Result<HistoryEntry, RestStoreError> {
        let request = self
            .client
            .post(self.config.collection_url())
            .json(&LogBody::from(&entry));
        let raw: Value = read_json(send(request, None).await?).await?;
        let id = match raw.get("id") {
            Some(Value::String(s)) => Some(DeviceId::new(s.clone())),
            Some(Value::Number(n)) => Some(DeviceId::new(n.to_string())),
            _ => None,
        };
        Ok(HistoryEntry { id, ..entry })
    }

    async fn remove(&self, id: &DeviceId) -> Result<(), RestStoreError> {
        send(self.client.delete(self.config.item_url(id.as_str())), Some(id)).await?;
        Ok(())
    }
}

fn decode_row(raw: Value) -> Result<Row, MalformedDevice> {
    // A row whose fields have unexpected types decodes as empty and is
    // rejected for its missing id.
    serde_json::from_value::<Record>(raw)
        .unwrap_or_default()
        .into_row()
}

/// Send a request and turn any non-success status into an error.
///
/// `item` names the record addressed by the request, so that a 404 is
/// reported as a missing record rather than an unreachable store.
async fn send(
    request: RequestBuilder,
    item: Option<&DeviceId>,
) -> Result<Response, RestStoreError> {
    let response = request.send().await.map_err(RestStoreError::Transport)?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND
        && let Some(id) = item
    {
        return Err(RestStoreError::NotFound { id: id.to_string() });
    }
    Err(RestStoreError::Status {
        status: status.as_u16(),
        url: response.url().to_string(),
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, RestStoreError> {
    let bytes = response.bytes().await.map_err(RestStoreError::Transport)?;
    serde_json::from_slice(&bytes).map_err(RestStoreError::Decode)
}

impl DeviceStore for RestDeviceStore {
    fn list_all(&self) -> impl Future<Output = Result<Inventory, TwinTankError>> + Send {
        async move { Ok(self.fetch_inventory().await?) }
    }

    fn create_device(
        &self,
        device: NewDevice,
    ) -> impl Future<Output = Result<Device, TwinTankError>> + Send {
        async move {
            let created = self.post_device(&device).await?;
            tracing::debug!(id = %created.id, name = %created.name, "device registered in store");
            Ok(created)
        }
    }

    fn update_device(
        &self,
        id: DeviceId,
        patch: DevicePatch,
    ) -> impl Future<Output = Result<(), TwinTankError>> + Send {
        async move { Ok(self.put_patch(&id, &patch).await?) }
    }

    fn append_log(
        &self,
        entry: HistoryEntry,
    ) -> impl Future<Output = Result<HistoryEntry, TwinTankError>> + Send {
        async move { Ok(self.post_log(entry).await?) }
    }

    fn delete_device(
        &self,
        id: DeviceId,
    ) -> impl Future<Output = Result<(), TwinTankError>> + Send {
        async move { Ok(self.remove(&id).await?) }
    }
}
