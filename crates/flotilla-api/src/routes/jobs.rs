//! Job status endpoints.

use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::routing::get;
use flotilla_core::status::{JobState, JobType, StatusRecord};
use serde::Deserialize;

use crate::AppState;
use crate::error::ApiError;

const DEFAULT_LIMIT: i64 = 50;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_jobs))
        .route("/active", get(active_job))
}

/// The most recently updated RUNNING job, or `null` when nothing is active.
async fn active_job(
    State(state): State<AppState>,
) -> Result<Json<Option<StatusRecord>>, ApiError> {
    Ok(Json(state.jobs.active().await?))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    state: Option<String>,
    #[serde(rename = "type")]
    job_type: Option<String>,
    limit: Option<i64>,
}

/// Current records by lifecycle state or by job category, most recently
/// updated first.
async fn list_jobs(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<StatusRecord>>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    let records = match (&params.state, &params.job_type) {
        (Some(label), _) => {
            state
                .store
                .list_by_state(&JobState::from_label(label), limit)
                .await?
        }
        (None, Some(label)) => {
            state
                .store
                .list_by_job_type(&JobType::from_label(label), limit)
                .await?
        }
        (None, None) => {
            return Err(ApiError::BadRequest(
                "either state or type is required".to_string(),
            ));
        }
    };
    Ok(Json(records))
}
