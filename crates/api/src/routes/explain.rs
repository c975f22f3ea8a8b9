use crate::error::ApiError;
use axum::Json;
use sched_core::{report::quality_report, HardSubjects, Schedule};
use serde::Deserialize;
use types::{Lesson, MetricWeights, QualityReport, TimeSlot};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExplainIn {
    pub lessons: Vec<Lesson>,
    #[serde(default)]
    pub reserved: Vec<TimeSlot>,
    #[serde(default)]
    pub weights: Option<MetricWeights>,
    #[serde(default)]
    pub hard_subjects: Option<Vec<String>>,
}

#[utoipa::path(
    post,
    path = "/v1/explain",
    tag = "timetable",
    request_body = ExplainIn,
    responses(
        (status = 200, description = "Quality breakdown of the given timetable", body = QualityReport),
        (status = 400, description = "Lessons clash or use invalid slots")
    )
)]
pub async fn explain(Json(input): Json<ExplainIn>) -> Result<Json<QualityReport>, ApiError> {
    let schedule = Schedule::from_base(input.lessons, input.reserved)?;
    let weights = input.weights.unwrap_or_default();
    let hard = match &input.hard_subjects {
        Some(keywords) => HardSubjects::new(keywords),
        None => HardSubjects::default(),
    };
    Ok(Json(quality_report(&schedule, &weights, &hard)))
}
