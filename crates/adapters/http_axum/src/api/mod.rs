//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod devices;
#[allow(clippy::missing_errors_doc)]
pub mod pumps;
#[allow(clippy::missing_errors_doc)]
pub mod snapshot;
pub mod sse;

use axum::Router;
use axum::routing::{get, post};

use twintank_app::ports::DeviceStore;

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<S>() -> Router<AppState<S>>
where
    S: DeviceStore + 'static,
{
    Router::new()
        // Snapshots
        .route("/snapshot", get(snapshot::latest::<S>))
        .route("/snapshot/stream", get(sse::stream::<S>))
        // Commands
        .route("/devices/{id}/state", post(pumps::set_state::<S>))
        .route("/devices/{id}/toggle", post(pumps::toggle::<S>))
        .route("/devices/{id}/consume", post(pumps::consume::<S>))
        // Administration
        .route(
            "/devices",
            get(devices::list::<S>).post(devices::create::<S>),
        )
        .route(
            "/devices/{id}",
            get(devices::get::<S>).delete(devices::delete::<S>),
        )
}
