//! Dashboard home page: cards, level bars, alerts and history.

use askama::Template;
use axum::extract::State;
use axum::response::{Html, IntoResponse, Response};

use twintank_app::ports::DeviceStore;
use twintank_domain::device::LevelBand;
use twintank_domain::history::HistoryEntry;
use twintank_domain::roles::Role;
use twintank_domain::snapshot::{DeviceView, Snapshot};
use twintank_domain::time::Timestamp;

use crate::state::AppState;

/// One device card.
pub struct CardView {
    pub id: String,
    pub name: String,
    pub role: &'static str,
    pub is_pump: bool,
    pub on: bool,
    pub value_label: String,
    pub percent: u8,
    /// CSS class of the level bar.
    pub band: &'static str,
    pub volume: Option<String>,
    /// Only the main tank offers simulated consumption.
    pub can_consume: bool,
    pub last_event: String,
    pub last_event_at: String,
}

impl From<&DeviceView> for CardView {
    fn from(view: &DeviceView) -> Self {
        let device = &view.device;
        Self {
            id: device.id.to_string(),
            name: device.name.clone(),
            role: role_title(device.role),
            is_pump: device.is_actuator(),
            on: device.state,
            value_label: view.value_label.clone(),
            percent: device.level.percent(),
            band: match view.band {
                Some(LevelBand::Critical) => "critical",
                Some(LevelBand::Low) => "low",
                Some(LevelBand::Normal) | None => "normal",
            },
            volume: view
                .volume
                .map(|v| format!("{} / {} L", v.litres, v.capacity_litres)),
            can_consume: device.role == Role::MainSensor,
            last_event: device.last_event.clone(),
            last_event_at: format_time(device.last_event_at),
        }
    }
}

/// One row of the history or activity tables.
pub struct RowView {
    pub device_name: String,
    pub event: String,
    pub value: String,
    pub at: String,
}

impl From<&HistoryEntry> for RowView {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            device_name: entry.device_name.clone(),
            event: entry.event.clone(),
            value: entry.value.clone(),
            at: format_time(entry.recorded_at),
        }
    }
}

/// One alert banner.
pub struct AlertView {
    pub severity: &'static str,
    pub message: String,
}

/// Home page template.
#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    refresh_seconds: u32,
    ready: bool,
    roles_resolved: bool,
    generated_at: String,
    alerts: Vec<AlertView>,
    cards: Vec<CardView>,
    history: Vec<RowView>,
    activity: Vec<RowView>,
}

impl HomeTemplate {
    fn new(refresh_seconds: u32, snapshot: Option<&Snapshot>) -> Self {
        let Some(snapshot) = snapshot else {
            return Self {
                refresh_seconds,
                ready: false,
                roles_resolved: false,
                generated_at: String::new(),
                alerts: Vec::new(),
                cards: Vec::new(),
                history: Vec::new(),
                activity: Vec::new(),
            };
        };
        Self {
            refresh_seconds,
            ready: true,
            roles_resolved: snapshot.roles_resolved,
            generated_at: format_time(snapshot.generated_at),
            alerts: snapshot
                .alerts
                .iter()
                .map(|alert| AlertView {
                    severity: alert.severity.as_str(),
                    message: alert.message.clone(),
                })
                .collect(),
            cards: snapshot.devices.iter().map(CardView::from).collect(),
            history: snapshot.history.iter().map(RowView::from).collect(),
            activity: snapshot.activity.iter().map(RowView::from).collect(),
        }
    }
}

impl IntoResponse for HomeTemplate {
    fn into_response(self) -> Response {
        Html(self.to_string()).into_response()
    }
}

fn role_title(role: Role) -> &'static str {
    match role {
        Role::MainPump => "Main pump",
        Role::BackupPump => "Backup pump",
        Role::MainSensor => "Main tank",
        Role::BackupSensor => "Backup tank",
        Role::Other => "Unassigned",
    }
}

fn format_time(at: Timestamp) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// `GET /`: installation overview, rendered from the latest snapshot.
pub async fn index<S>(State(state): State<AppState<S>>) -> HomeTemplate
where
    S: DeviceStore + 'static,
{
    HomeTemplate::new(state.refresh_seconds, state.snapshots.latest().as_ref())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::testing::{read_body, test_state};

    #[tokio::test]
    async fn should_render_waiting_page_before_first_cycle() {
        let (state, _store) = test_state();
        let app = crate::router::build(state);

        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_body(response).await;
        assert!(body.contains(r#"http-equiv="refresh" content="5""#));
        assert!(body.contains("Waiting for the first cycle"));
    }

    #[tokio::test]
    async fn should_render_cards_alerts_and_forms() {
        let (state, _store) = test_state();
        state
            .cycle
            .execute(twintank_app::control_cycle::UserCommand::SimulateConsumption {
                device: twintank_domain::id::DeviceId::new("3"),
            })
            .await
            .unwrap();
        let app = crate::router::build(state.with_refresh_seconds(3));

        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body = read_body(response).await;
        assert!(body.contains(r#"content="3""#));
        assert!(body.contains("Main tank"));
        assert!(body.contains("width: 23%"));
        assert!(body.contains("460 / 2000 L"));
        assert!(body.contains("Low capacity in main tank"));
        assert!(body.contains(r#"action="/devices/1/toggle""#));
        assert!(body.contains(r#"action="/devices/3/consume""#));
        assert!(!body.contains(r#"action="/devices/4/consume""#));
        assert!(body.contains("Simulated consumption"));
    }
}
