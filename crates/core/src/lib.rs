pub mod catalog;
pub mod difficulty;
pub mod report;
pub mod schedule;
pub mod scoring;

use async_trait::async_trait;
use thiserror::Error;

pub use catalog::Catalog;
pub use difficulty::{Difficulty, HardSubjects};
pub use schedule::{Conflict, LessonIdx, Schedule};
pub use types::{
    Classroom, GenerateEnvelope, GenerateParams, GenerateResult, Instance, Lesson, Subject,
    Teacher, TimeSlot,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid instance: {0}")]
    Msg(String),
    #[error("invalid params: {0}")]
    Params(String),
}

pub fn validate(inst: &Instance) -> Result<(), ValidationError> {
    let mut errors: Vec<String> = Vec::new();

    fn chk_unique<I: ToString>(name: &str, ids: impl Iterator<Item = I>, errors: &mut Vec<String>) {
        use std::collections::HashSet;
        let mut seen = HashSet::new();
        for id in ids {
            let s = id.to_string();
            if !seen.insert(s.clone()) {
                errors.push(format!("duplicate {name}: {s}"));
            }
        }
    }
    chk_unique("teacher", inst.teachers.iter().map(|x| &x.name.0), &mut errors);
    chk_unique(
        "classroom",
        inst.classrooms.iter().map(|x| &x.number.0),
        &mut errors,
    );

    use std::collections::HashSet;
    let teachers: HashSet<_> = inst.teachers.iter().map(|t| &t.name).collect();
    let rooms: HashSet<_> = inst.classrooms.iter().map(|r| &r.number).collect();

    for t in &inst.teachers {
        if let Some(home) = &t.home_classroom {
            if !rooms.contains(home) {
                errors.push(format!(
                    "teacher {} has unknown home classroom {}",
                    t.name, home
                ));
            }
        }
    }

    let mut curriculum = HashSet::new();
    for s in &inst.subjects {
        if let Some(class) = s.classes.first() {
            if !curriculum.insert((&s.name, &s.teacher, class)) {
                errors.push(format!(
                    "duplicate subject {} for teacher {} and class {}",
                    s.name, s.teacher, class
                ));
            }
        }
        if !teachers.contains(&s.teacher) {
            errors.push(format!(
                "subject {} references missing teacher {}",
                s.name, s.teacher
            ));
        }
        if s.hours_per_week == 0 {
            errors.push(format!("subject {} has hoursPerWeek=0", s.name));
        }
        if s.classes.is_empty() {
            errors.push(format!("subject {} has no target classes", s.name));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Msg(errors.join("; ")))
    }
}

/// Upper bound on parallel annealing chains per request.
pub const MAX_CHAINS: u32 = 64;

pub fn validate_params(params: &GenerateParams) -> Result<(), ValidationError> {
    let mut errors: Vec<String> = Vec::new();
    let o = &params.optimize;

    if !(o.cooling_rate > 0.0 && o.cooling_rate <= 1.0) {
        errors.push(format!("coolingRate {} is outside (0, 1]", o.cooling_rate));
    }
    if !(o.initial_temperature.is_finite() && o.initial_temperature >= 0.0) {
        errors.push(format!(
            "initialTemperature {} must be finite and non-negative",
            o.initial_temperature
        ));
    }
    if o.chains == 0 || o.chains > MAX_CHAINS {
        errors.push(format!("chains {} is outside 1..={MAX_CHAINS}", o.chains));
    }
    if o.swap_attempts == 0 {
        errors.push("swapAttempts must be at least 1".into());
    }
    let w = &params.weights;
    for (name, v) in [
        ("teacherGaps", w.teacher_gaps),
        ("classGaps", w.class_gaps),
        ("dailyLoad", w.daily_load),
        ("hardTiming", w.hard_timing),
    ] {
        if !v.is_finite() {
            errors.push(format!("weight {name} is not finite"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Params(errors.join("; ")))
    }
}

/// Checks everything about a request except base-lesson conflicts, which
/// surface when the schedule is built.
pub fn validate_envelope(env: &GenerateEnvelope) -> Result<(), ValidationError> {
    validate(&env.instance)?;
    validate_params(&env.params)?;

    let bad: Vec<String> = env
        .reserved
        .iter()
        .chain(env.base.iter().map(|l| &l.slot))
        .filter(|s| !s.is_valid())
        .map(|s| format!("slot {s} is outside the school day"))
        .collect();
    if bad.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Msg(bad.join("; ")))
    }
}

#[async_trait]
pub trait Generator: Send + Sync + 'static {
    async fn generate(&self, env: GenerateEnvelope) -> anyhow::Result<GenerateResult>;
}
