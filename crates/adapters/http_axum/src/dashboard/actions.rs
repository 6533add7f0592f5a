//! Dashboard form handlers. Each one runs a command, then redirects home.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};

use twintank_app::control_cycle::UserCommand;
use twintank_app::ports::DeviceStore;
use twintank_domain::id::DeviceId;

use super::DashboardError;
use crate::state::AppState;

/// Possible responses from the dashboard form handlers.
pub enum ActionResponse {
    /// Redirect back to the overview.
    Redirect(Redirect),
}

impl IntoResponse for ActionResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Redirect(redirect) => redirect.into_response(),
        }
    }
}

async fn run<S>(state: &AppState<S>, command: UserCommand) -> Result<ActionResponse, DashboardError>
where
    S: DeviceStore + 'static,
{
    state.cycle.execute(command).await?;
    Ok(ActionResponse::Redirect(Redirect::to("/")))
}

/// `POST /devices/:id/toggle`: flip a pump (PRG).
pub async fn toggle<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<ActionResponse, DashboardError>
where
    S: DeviceStore + 'static,
{
    run(
        &state,
        UserCommand::TogglePump {
            device: DeviceId::new(id),
        },
    )
    .await
}

/// `POST /devices/:id/consume`: draw water from a tank (PRG).
pub async fn consume<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<ActionResponse, DashboardError>
where
    S: DeviceStore + 'static,
{
    run(
        &state,
        UserCommand::SimulateConsumption {
            device: DeviceId::new(id),
        },
    )
    .await
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;
    use twintank_domain::device::Level;

    use crate::testing::{read_body, test_state};

    #[tokio::test]
    async fn should_toggle_and_redirect_home() {
        let (state, store) = test_state();
        let app = crate::router::build(state);

        let response = app
            .oneshot(Request::post("/devices/1/toggle").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
        assert!(store.device("1").unwrap().state);
    }

    #[tokio::test]
    async fn should_consume_and_redirect_home() {
        let (state, store) = test_state();
        let app = crate::router::build(state);

        let response = app
            .oneshot(Request::post("/devices/3/consume").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(store.device("3").unwrap().level, Level::new(23));
    }

    #[tokio::test]
    async fn should_render_error_page_for_unknown_device() {
        let (state, _store) = test_state();
        let app = crate::router::build(state);

        let response = app
            .oneshot(Request::post("/devices/99/toggle").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = read_body(response).await;
        assert!(body.contains("Device 99 not found"));
    }
}
