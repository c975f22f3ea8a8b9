use axum::Json;
use sched_core::{validate, ValidationError};
use serde::Serialize;
use types::Instance;

#[derive(Serialize, utoipa::ToSchema)]
pub struct ValidationReport {
    pub ok: bool,
    pub errors: Vec<String>,
}

#[utoipa::path(
    post,
    path = "/v1/validate",
    tag = "timetable",
    request_body = Instance,
    responses((status = 200, description = "Catalog consistency check", body = ValidationReport))
)]
pub async fn validate_handler(Json(inst): Json<Instance>) -> Json<ValidationReport> {
    let errors = match validate(&inst) {
        Ok(()) => vec![],
        Err(ValidationError::Msg(msg) | ValidationError::Params(msg)) => msg
            .split(';')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
    };
    Json(ValidationReport {
        ok: errors.is_empty(),
        errors,
    })
}
