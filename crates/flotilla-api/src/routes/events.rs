//! Event ingress: producer events and container lifecycle notifications.

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use flotilla_core::event::{ContainerNotification, Envelope};
use flotilla_events::{CONTAINER_STATE_CHANGE, RouteOutcome};
use serde_json::{Value, json};
use tracing::warn;

use crate::AppState;
use crate::error::ApiError;

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(ingest))
}

/// Accept one event. Container state changes additionally drive the
/// lifecycle monitor; a failure there is logged and left to the next
/// notification, the event itself is still archived and routed.
async fn ingest(
    State(state): State<AppState>,
    Json(envelope): Json<Envelope>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if envelope.detail_type == CONTAINER_STATE_CHANGE {
        match serde_json::from_value::<ContainerNotification>(envelope.detail.clone()) {
            Ok(notification) => {
                if let Err(e) = state.monitor.observe(notification).await {
                    warn!(error = %e, "Container monitor failed");
                }
            }
            Err(e) => {
                warn!(error = %e, "Malformed container notification");
            }
        }
    }

    let outcome = state.router.ingest(envelope).await;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "forwarded": outcome == RouteOutcome::Forwarded })),
    ))
}
