//! Server-Sent Events (SSE) stream of snapshots.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use twintank_app::ports::DeviceStore;
use twintank_domain::snapshot::Snapshot;

use crate::state::AppState;

const EVENT_NAME: &str = "snapshot";

fn to_event(snapshot: &Snapshot) -> Option<Event> {
    match serde_json::to_string(snapshot) {
        Ok(json) => Some(Event::default().event(EVENT_NAME).data(json)),
        Err(err) => {
            tracing::warn!(%err, "failed to serialize snapshot for SSE stream");
            None
        }
    }
}

/// `GET /api/snapshot/stream`: SSE stream of snapshots.
///
/// Sends the latest snapshot first, if any, then every snapshot published
/// afterwards as a JSON `data:` frame. The stream ends when the client
/// disconnects or the bus is dropped.
pub async fn stream<S>(
    State(state): State<AppState<S>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>
where
    S: DeviceStore + 'static,
{
    let receiver = state.snapshots.subscribe();
    let initial = tokio_stream::iter(state.snapshots.latest().as_ref().and_then(to_event));
    let live = BroadcastStream::new(receiver).filter_map(|result| match result {
        Ok(snapshot) => to_event(&snapshot),
        Err(BroadcastStreamRecvError::Lagged(n)) => {
            tracing::warn!(skipped = n, "SSE subscriber lagged, some snapshots were dropped");
            None
        }
    });

    Sse::new(initial.chain(live).map(Ok)).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    use crate::testing::test_state;

    #[tokio::test]
    async fn should_subscribe_to_snapshot_bus_when_stream_created() {
        let (state, _store) = test_state();
        let bus = std::sync::Arc::clone(&state.snapshots);
        let mut rx = bus.subscribe();

        let _sse = super::stream(axum::extract::State(state.clone())).await;

        let outcome = state.cycle.run().await;
        let received = rx.recv().await.unwrap();
        assert_eq!(Some(&received), outcome.snapshot());
    }

    #[tokio::test]
    async fn should_answer_with_event_stream_content_type() {
        let (state, _store) = test_state();
        let app = crate::router::build(state);

        let response = app
            .oneshot(
                Request::get("/api/snapshot/stream")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );
    }
}
