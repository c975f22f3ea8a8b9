use crate::{error::ApiError, state::AppState};
use axum::{extract::State, Json};
use sched_core::validate_envelope;
use serde::Serialize;
use types::GenerateEnvelope;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobCreated {
    pub job_id: String,
    pub status: &'static str,
}

/// Queues a generation run. Input problems are reported right away; base
/// schedule conflicts surface as a failed job.
#[utoipa::path(
    post,
    path = "/v1/generate",
    tag = "timetable",
    request_body = GenerateEnvelope,
    responses(
        (status = 200, description = "Job enqueued", body = JobCreated),
        (status = 400, description = "Invalid catalog, params or slots")
    )
)]
pub async fn generate(
    State(state): State<AppState>,
    Json(env): Json<GenerateEnvelope>,
) -> Result<Json<JobCreated>, ApiError> {
    validate_envelope(&env)?;
    let id = state.jobs.enqueue(env);
    Ok(Json(JobCreated {
        job_id: id.0,
        status: "queued",
    }))
}
