use crate::difficulty::{is_prime_time, Difficulty};
use crate::schedule::Schedule;
use types::{DayOfWeek, MetricWeights, DAYS_PER_WEEK};

/// Components of the schedule quality metric. Lower `value` is better.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Metric {
    pub teacher_gaps: u32,
    pub class_gaps: u32,
    pub load_stddev: f64,
    pub bad_timing: u32,
    pub value: f64,
}

/// Evaluates a schedule whose lesson set is fixed.
///
/// Whether a lesson is hard depends only on its subject, which never changes
/// while slots are being swapped, so the predicate is applied once up front.
#[derive(Clone, Debug)]
pub struct QualityMetric {
    weights: MetricWeights,
    hard: Vec<bool>,
}

impl QualityMetric {
    pub fn new(schedule: &Schedule, weights: MetricWeights, difficulty: &dyn Difficulty) -> Self {
        let hard = schedule
            .lessons()
            .iter()
            .map(|l| difficulty.is_hard(&l.subject))
            .collect();
        Self { weights, hard }
    }

    pub fn weights(&self) -> &MetricWeights {
        &self.weights
    }

    pub fn evaluate(&self, schedule: &Schedule) -> Metric {
        debug_assert_eq!(self.hard.len(), schedule.len());
        let teacher_gaps = schedule.total_teacher_gaps();
        let class_gaps = schedule.total_class_gaps();
        let load_stddev = daily_load_stddev(schedule);
        let bad_timing = schedule
            .lessons()
            .iter()
            .zip(&self.hard)
            .filter(|(l, &hard)| hard && !is_prime_time(l.slot))
            .count() as u32;

        let w = &self.weights;
        let value = w.teacher_gaps * teacher_gaps as f64
            + w.class_gaps * class_gaps as f64
            + w.daily_load * load_stddev
            + w.hard_timing * bad_timing as f64;

        Metric {
            teacher_gaps,
            class_gaps,
            load_stddev,
            bad_timing,
            value,
        }
    }
}

pub fn evaluate(schedule: &Schedule, weights: &MetricWeights, difficulty: &dyn Difficulty) -> Metric {
    QualityMetric::new(schedule, *weights, difficulty).evaluate(schedule)
}

/// Population standard deviation of lessons per weekday.
pub fn daily_load_stddev(schedule: &Schedule) -> f64 {
    let loads = DayOfWeek::ALL.map(|d| schedule.day_load(d) as f64);
    let n = DAYS_PER_WEEK as f64;
    let mean = loads.iter().sum::<f64>() / n;
    let variance = loads.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}
