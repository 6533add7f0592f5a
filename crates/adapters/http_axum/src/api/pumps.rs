//! JSON handlers for user commands: pump switching and consumption.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use twintank_app::control_cycle::{CommandReport, UserCommand};
use twintank_app::ports::DeviceStore;
use twintank_domain::device::Device;
use twintank_domain::id::DeviceId;
use twintank_domain::snapshot::Snapshot;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for setting a pump state.
#[derive(Deserialize)]
pub struct SetStateRequest {
    pub on: bool,
}

/// Body returned after a command: the device as written and the snapshot
/// of the cycle that followed, when that cycle completed.
#[derive(Serialize)]
pub struct CommandBody {
    pub device: Device,
    pub snapshot: Option<Snapshot>,
}

impl From<CommandReport> for CommandBody {
    fn from(report: CommandReport) -> Self {
        Self {
            snapshot: report.cycle.snapshot().cloned(),
            device: report.device,
        }
    }
}

/// Possible responses from the command endpoints.
pub enum CommandResponse {
    Ok(Json<CommandBody>),
}

impl IntoResponse for CommandResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

async fn execute<S>(state: &AppState<S>, command: UserCommand) -> Result<CommandResponse, ApiError>
where
    S: DeviceStore + 'static,
{
    let report = state.cycle.execute(command).await?;
    Ok(CommandResponse::Ok(Json(report.into())))
}

/// `POST /api/devices/:id/state`
pub async fn set_state<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Json(req): Json<SetStateRequest>,
) -> Result<CommandResponse, ApiError>
where
    S: DeviceStore + 'static,
{
    let command = UserCommand::SetPump {
        device: DeviceId::new(id),
        on: req.on,
    };
    execute(&state, command).await
}

/// `POST /api/devices/:id/toggle`
pub async fn toggle<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<CommandResponse, ApiError>
where
    S: DeviceStore + 'static,
{
    execute(
        &state,
        UserCommand::TogglePump {
            device: DeviceId::new(id),
        },
    )
    .await
}

/// `POST /api/devices/:id/consume`
pub async fn consume<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<CommandResponse, ApiError>
where
    S: DeviceStore + 'static,
{
    execute(
        &state,
        UserCommand::SimulateConsumption {
            device: DeviceId::new(id),
        },
    )
    .await
}
