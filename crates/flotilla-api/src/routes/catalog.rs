//! Catalog endpoints: job submission and entry browsing.

use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use flotilla_core::catalog::CatalogEntry;
use flotilla_core::status::JobType;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::AppState;
use crate::error::ApiError;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_children).post(start_catalog).delete(start_purge))
}

async fn start_catalog(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    submit(state, JobType::Catalog).await
}

async fn start_purge(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    submit(state, JobType::Purge).await
}

async fn submit(state: AppState, job_type: JobType) -> Result<(StatusCode, Json<Value>), ApiError> {
    let task_id = state.jobs.submit(job_type).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "taskId": task_id.as_str() })),
    ))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    parent: Option<String>,
}

async fn list_children(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<CatalogEntry>>, ApiError> {
    let parent = params.parent.unwrap_or_else(|| "root".to_string());
    let children = state.catalog.list_children(&parent).await?;
    Ok(Json(children))
}
