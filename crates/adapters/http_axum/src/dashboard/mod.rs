//! Server-side rendered HTML dashboard (no JavaScript).
//!
//! - `GET  /`: installation overview
//! - `POST /devices/:id/toggle`: switch a pump (PRG)
//! - `POST /devices/:id/consume`: simulate consumption on a tank (PRG)

#[allow(clippy::missing_errors_doc)]
pub mod actions;
pub mod home;

use askama::Template;
use axum::Router;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};

use twintank_app::ports::DeviceStore;
use twintank_domain::error::TwinTankError;

use crate::error::status_of;
use crate::state::AppState;

/// Build the dashboard sub-router for SSR HTML pages.
pub fn routes<S>() -> Router<AppState<S>>
where
    S: DeviceStore + 'static,
{
    Router::new()
        .route("/", get(home::index::<S>))
        .route("/devices/{id}/toggle", post(actions::toggle::<S>))
        .route("/devices/{id}/consume", post(actions::consume::<S>))
}

/// Error page template.
#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate {
    status: u16,
    message: String,
}

/// Renders a [`TwinTankError`] as an HTML error page.
pub struct DashboardError(TwinTankError);

impl From<TwinTankError> for DashboardError {
    fn from(err: TwinTankError) -> Self {
        Self(err)
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let (status, message) = status_of(&self.0);
        let page = ErrorTemplate {
            status: status.as_u16(),
            message,
        };
        match page.render() {
            Ok(html) => (status, Html(html)).into_response(),
            Err(err) => {
                tracing::error!(%err, "failed to render error page");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
