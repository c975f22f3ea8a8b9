//! One timetable generation run: validate, place mandatory subjects, anneal,
//! report.

use async_trait::async_trait;
use sched_core::report::quality_report;
use sched_core::{validate_envelope, Catalog, Conflict, Generator, HardSubjects, Schedule, ValidationError};
use solver_greedy::MandatoryPlacer;
use thiserror::Error;
use tracing::info;
use types::{GenerateEnvelope, GenerateParams, GenerateResult, GenerateStatus};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("base schedule is inconsistent: {0}")]
    Base(#[from] Conflict),
}

pub fn hard_subjects(params: &GenerateParams) -> HardSubjects {
    match &params.hard_subjects {
        Some(keywords) => HardSubjects::new(keywords.iter().map(String::as_str)),
        None => HardSubjects::default(),
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TimetablePipeline;

impl TimetablePipeline {
    pub fn new() -> Self {
        Self
    }

    pub fn run(&self, env: GenerateEnvelope) -> Result<GenerateResult, PipelineError> {
        validate_envelope(&env)?;
        let GenerateEnvelope {
            instance,
            base,
            reserved,
            params,
        } = env;

        let catalog = Catalog::new(&instance);
        let difficulty = hard_subjects(&params);
        let mut schedule = Schedule::from_base(base, reserved)?;
        info!(
            base = schedule.len(),
            reserved = schedule.reserved().len(),
            subjects = catalog.subjects().len(),
            "generation started"
        );

        let placement = MandatoryPlacer::new(&catalog, &difficulty).place_all(&mut schedule);

        let optimization = params.run_optimizer.then(|| {
            solver_heur::optimize(&mut schedule, &params.optimize, &params.weights, &difficulty)
        });

        let mut quality = quality_report(&schedule, &params.weights, &difficulty);
        quality.placement_rate = Some(placement.success_rate());

        let status = if placement.shortfalls.is_empty() {
            GenerateStatus::Solved
        } else {
            GenerateStatus::Partial
        };
        info!(
            ?status,
            lessons = schedule.len(),
            metric = quality.metric,
            "generation finished"
        );

        Ok(GenerateResult {
            status,
            lessons: schedule.into_lessons(),
            placement,
            optimization,
            quality,
        })
    }
}

#[async_trait]
impl Generator for TimetablePipeline {
    async fn generate(&self, env: GenerateEnvelope) -> anyhow::Result<GenerateResult> {
        let pipeline = *self;
        let res = tokio::task::spawn_blocking(move || pipeline.run(env)).await??;
        Ok(res)
    }
}
