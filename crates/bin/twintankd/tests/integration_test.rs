//! End-to-end tests for the full twintankd stack.
//!
//! Each test wires the complete application (in-memory store, real control
//! cycle, real services, real axum router) and exercises the HTTP layer via
//! `tower::ServiceExt::oneshot`: no TCP port is bound.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;
use twintank_adapter_http_axum::router;
use twintank_adapter_http_axum::state::{AppState, Cycle};
use twintank_adapter_store_memory::InMemoryDeviceStore;
use twintank_app::control_cycle::{ControlCycle, CycleSettings};
use twintank_app::ports::DeviceStore;
use twintank_app::services::device_service::DeviceService;
use twintank_app::snapshot_bus::SnapshotBus;
use twintank_domain::device::{Device, Level};
use twintank_domain::roles::Role;

struct Stack {
    store: Arc<InMemoryDeviceStore>,
    cycle: Arc<Cycle<Arc<InMemoryDeviceStore>>>,
    app: axum::Router,
}

fn device(id: &str, name: &str, role: Role, state: bool, level: i64) -> Device {
    Device::builder()
        .id(id)
        .name(name)
        .role(role)
        .state(state)
        .level(Level::new(level))
        .build()
        .unwrap()
}

/// Build a fully-wired stack around the given pump states and tank levels.
fn stack(main_on: bool, backup_on: bool, main: i64, backup: i64) -> Stack {
    let store = Arc::new(InMemoryDeviceStore::with_devices(vec![
        device("p1", "BombaDeAgua", Role::MainPump, main_on, 0),
        device("p2", "BombaDeAgua Respaldo", Role::BackupPump, backup_on, 0),
        device("s1", "Tinaco Principal", Role::MainSensor, false, main),
        device("s2", "Tinaco Respaldo", Role::BackupSensor, false, backup),
    ]));
    let bus = Arc::new(SnapshotBus::new(16));
    let cycle = Arc::new(ControlCycle::new(
        Arc::clone(&store),
        Arc::clone(&bus),
        CycleSettings::default(),
    ));
    let service = Arc::new(DeviceService::new(Arc::clone(&store)));
    let app = router::build(AppState::new(Arc::clone(&cycle), service, bus));
    Stack { store, cycle, app }
}

async fn get_json(app: &axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let resp = app
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn level_of(store: &InMemoryDeviceStore, id: &str) -> Level {
    store
        .list_devices()
        .await
        .unwrap()
        .into_iter()
        .find(|d| d.id.as_str() == id)
        .unwrap()
        .level
}

// ---------------------------------------------------------------------------
// Health check and dashboard
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_return_ok_when_health_check_called() {
    let stack = stack(false, false, 50, 50);
    let resp = stack
        .app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn should_render_dashboard_after_first_cycle() {
    let stack = stack(false, false, 50, 50);
    stack.cycle.tick().await;

    let resp = stack
        .app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = String::from_utf8(resp.into_body().collect().await.unwrap().to_bytes().to_vec())
        .unwrap();
    assert!(body.contains("Tinaco Principal"));
    assert!(body.contains("BombaDeAgua Respaldo"));
}

// ---------------------------------------------------------------------------
// Control scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_fill_main_tank_and_report_it_full() {
    let stack = stack(true, false, 90, 15);
    stack.cycle.tick().await;

    assert_eq!(level_of(&stack.store, "s1").await, Level::new(95));
    assert_eq!(level_of(&stack.store, "s2").await, Level::new(5));
    let (status, snapshot) = get_json(&stack.app, "/api/snapshot").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["alerts"][0]["severity"], "info");
    assert_eq!(snapshot["alerts"][0]["message"], "Main tank full");
}

#[tokio::test]
async fn should_shut_off_main_pump_once_when_backup_runs_dry() {
    let stack = stack(true, false, 50, 0);
    stack.cycle.tick().await;
    stack.cycle.tick().await;

    let pump = stack
        .store
        .list_devices()
        .await
        .unwrap()
        .into_iter()
        .find(|d| d.id.as_str() == "p1")
        .unwrap();
    assert!(!pump.state);
    let history = stack.store.list_all().await.unwrap().history;
    let shutoffs = history
        .iter()
        .filter(|e| e.event == "Safety Shutoff")
        .count();
    assert_eq!(shutoffs, 1);
}

#[tokio::test]
async fn should_clamp_backup_fill_at_one_hundred() {
    let stack = stack(false, true, 50, 92);
    stack.cycle.tick().await;

    assert_eq!(level_of(&stack.store, "s2").await, Level::FULL);
    let (_, snapshot) = get_json(&stack.app, "/api/snapshot").await;
    assert_eq!(snapshot["alerts"][0]["severity"], "success");
}

#[tokio::test]
async fn should_warn_low_capacity_right_after_consumption() {
    let stack = stack(false, false, 28, 50);

    let resp = stack
        .app
        .clone()
        .oneshot(
            Request::post("/api/devices/s1/consume")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    assert_eq!(level_of(&stack.store, "s1").await, Level::new(23));
    let (_, snapshot) = get_json(&stack.app, "/api/snapshot").await;
    assert_eq!(snapshot["alerts"][0]["message"], "Low capacity in main tank");
}

// ---------------------------------------------------------------------------
// Administration
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_leave_roles_unresolved_after_registering_a_second_main_pump() {
    let stack = stack(false, false, 50, 50);

    let resp = stack
        .app
        .clone()
        .oneshot(
            Request::post("/api/devices")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"name":"Bomba extra","kind":"actuator"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    stack.cycle.tick().await;
    let (_, snapshot) = get_json(&stack.app, "/api/snapshot").await;
    assert_eq!(snapshot["roles_resolved"], false);
    assert_eq!(snapshot["alerts"].as_array().unwrap().len(), 0);
    assert_eq!(snapshot["devices"].as_array().unwrap().len(), 5);
}
