//! JSON handler for the latest snapshot.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use twintank_app::ports::DeviceStore;
use twintank_domain::snapshot::Snapshot;

use crate::state::AppState;

#[derive(Serialize)]
struct PendingBody {
    error: &'static str,
}

/// Possible responses from the snapshot endpoint.
pub enum SnapshotResponse {
    Ok(Json<Snapshot>),
    /// No cycle has completed since startup.
    Pending,
}

impl IntoResponse for SnapshotResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
            Self::Pending => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(PendingBody {
                    error: "no snapshot published yet",
                }),
            )
                .into_response(),
        }
    }
}

/// `GET /api/snapshot`
pub async fn latest<S>(State(state): State<AppState<S>>) -> SnapshotResponse
where
    S: DeviceStore + 'static,
{
    match state.snapshots.latest() {
        Some(snapshot) => SnapshotResponse::Ok(Json(snapshot)),
        None => SnapshotResponse::Pending,
    }
}
