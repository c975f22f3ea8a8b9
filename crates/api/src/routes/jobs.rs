use crate::{error::ApiError, state::AppState};
use axum::{
    extract::{Path, State},
    Json,
};
use jobs::JobStatus;
use types::GenerateResult;

#[utoipa::path(
    get,
    path = "/v1/jobs/{id}",
    tag = "timetable",
    params(("id" = String, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Job status", body = JobStatus),
        (status = 404, description = "Unknown job")
    )
)]
pub async fn status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobStatus>, ApiError> {
    state
        .jobs
        .get(&id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("job {id} not found")))
}

#[utoipa::path(
    get,
    path = "/v1/jobs/{id}/result",
    tag = "timetable",
    params(("id" = String, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Generated timetable", body = GenerateResult),
        (status = 404, description = "Unknown job"),
        (status = 409, description = "Job still queued or running"),
        (status = 422, description = "Job failed")
    )
)]
pub async fn result(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GenerateResult>, ApiError> {
    match state.jobs.get(&id) {
        Some(JobStatus::Solved { result }) => Ok(Json(result)),
        Some(JobStatus::Failed { message }) => Err(ApiError::Failed(message)),
        Some(_) => Err(ApiError::NotReady(format!("job {id} is not finished"))),
        None => Err(ApiError::NotFound(format!("job {id} not found"))),
    }
}
