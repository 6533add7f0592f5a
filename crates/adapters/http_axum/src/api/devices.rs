//! JSON REST handlers for device administration.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use twintank_app::ports::DeviceStore;
use twintank_domain::device::{Device, DeviceKind, NewDevice};
use twintank_domain::error::TwinTankError;
use twintank_domain::id::DeviceId;
use twintank_domain::roles::Role;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for registering a device.
///
/// Without a role, the role is inferred from the name.
#[derive(Deserialize)]
pub struct CreateDeviceRequest {
    pub name: String,
    pub kind: DeviceKind,
    pub role: Option<Role>,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Device>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get endpoint.
pub enum GetResponse {
    Ok(Json<Device>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<Device>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the delete endpoint.
pub enum DeleteResponse {
    NoContent,
}

impl IntoResponse for DeleteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// `GET /api/devices`
pub async fn list<S>(State(state): State<AppState<S>>) -> Result<ListResponse, ApiError>
where
    S: DeviceStore + 'static,
{
    let devices = state.device_service.list_devices().await?;
    Ok(ListResponse::Ok(Json(devices)))
}

/// `GET /api/devices/:id`
pub async fn get<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError>
where
    S: DeviceStore + 'static,
{
    let device = state.device_service.get_device(&DeviceId::new(id)).await?;
    Ok(GetResponse::Ok(Json(device)))
}

/// `POST /api/devices`
pub async fn create<S>(
    State(state): State<AppState<S>>,
    Json(req): Json<CreateDeviceRequest>,
) -> Result<CreateResponse, ApiError>
where
    S: DeviceStore + 'static,
{
    let device = NewDevice::new(req.name, req.kind, req.role).map_err(TwinTankError::from)?;
    let created = state.device_service.create_device(device).await?;
    Ok(CreateResponse::Created(Json(created)))
}

/// `DELETE /api/devices/:id`
pub async fn delete<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<DeleteResponse, ApiError>
where
    S: DeviceStore + 'static,
{
    state.device_service.delete_device(DeviceId::new(id)).await?;
    Ok(DeleteResponse::NoContent)
}
