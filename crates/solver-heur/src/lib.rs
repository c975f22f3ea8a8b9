use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use sched_core::scoring::QualityMetric;
use sched_core::{Difficulty, LessonIdx, Schedule};
use tracing::{debug, info, warn};
use types::{BestPoint, MetricWeights, OptimizationStats, OptimizeParams};

/// Metropolis criterion: improving moves always pass, worsening ones with
/// probability `exp(-delta / temperature)`, nothing once the system is frozen.
pub fn acceptance_probability(delta: f64, temperature: f64) -> f64 {
    if delta < 0.0 {
        1.0
    } else if temperature <= 0.0 {
        0.0
    } else {
        (-delta / temperature).exp()
    }
}

/// Simulated annealing over lesson time slots.
///
/// Moves swap the slots of two regular lessons; exam-practice lessons stay
/// pinned. The schedule ends up at the best assignment seen.
pub struct Annealer<'a, R> {
    params: &'a OptimizeParams,
    weights: MetricWeights,
    difficulty: &'a dyn Difficulty,
    rng: R,
}

impl<'a, R: Rng> Annealer<'a, R> {
    pub fn new(
        params: &'a OptimizeParams,
        weights: MetricWeights,
        difficulty: &'a dyn Difficulty,
        rng: R,
    ) -> Self {
        Self {
            params,
            weights,
            difficulty,
            rng,
        }
    }

    pub fn run(&mut self, schedule: &mut Schedule) -> OptimizationStats {
        let metric = QualityMetric::new(schedule, self.weights, self.difficulty);
        let movable: Vec<LessonIdx> = schedule
            .lessons()
            .iter()
            .enumerate()
            .filter(|(_, l)| !l.exam_practice)
            .map(|(i, _)| i)
            .collect();

        let initial = metric.evaluate(schedule).value;
        let mut current = initial;
        let mut best = initial;
        let mut best_slots = schedule.slot_assignment();
        let mut temperature = self.params.initial_temperature;
        let mut stats = OptimizationStats {
            initial_metric: initial,
            final_metric: initial,
            iterations: self.params.max_iterations,
            improvements: 0,
            accepted_worse: 0,
            skipped: 0,
            chains: 1,
            best_chain: 0,
            best_history: Vec::new(),
        };
        debug!(initial, movable = movable.len(), "annealing started");

        for iteration in 0..self.params.max_iterations {
            let Some((a, b)) = self.pick_swap(schedule, &movable) else {
                stats.skipped += 1;
                continue;
            };
            if let Err(e) = schedule.swap_slots(a, b) {
                warn!(%e, "swap rejected");
                stats.skipped += 1;
                continue;
            }
            debug_assert!(schedule.check_invariants().is_ok());

            let candidate = metric.evaluate(schedule).value;
            let delta = candidate - current;

            if delta < 0.0 {
                current = candidate;
                stats.improvements += 1;
                if candidate < best {
                    best = candidate;
                    best_slots = schedule.slot_assignment();
                    stats.best_history.push(BestPoint {
                        iteration,
                        metric: best,
                    });
                    debug!(iteration, best, "new best metric");
                }
            } else if self.rng.gen::<f64>() < acceptance_probability(delta, temperature) {
                current = candidate;
                stats.accepted_worse += 1;
            } else {
                let undone = schedule.swap_slots(a, b);
                debug_assert!(undone.is_ok());
            }

            temperature *= self.params.cooling_rate;
        }

        if let Err(e) = schedule.restore_slots(&best_slots) {
            warn!(%e, "could not restore best assignment");
        }
        stats.final_metric = best;
        stats
    }

    /// Draws random distinct pairs until one can trade slots without conflicts.
    fn pick_swap(&mut self, schedule: &Schedule, movable: &[LessonIdx]) -> Option<(LessonIdx, LessonIdx)> {
        if movable.len() < 2 {
            return None;
        }
        let lessons = schedule.lessons();
        for _ in 0..self.params.swap_attempts {
            let i = self.rng.gen_range(0..movable.len());
            let mut j = self.rng.gen_range(0..movable.len() - 1);
            if j >= i {
                j += 1;
            }
            let (a, b) = (movable[i], movable[j]);
            if lessons[a].slot != lessons[b].slot && schedule.can_swap(a, b) {
                return Some((a, b));
            }
        }
        None
    }
}

fn chain_rng(seed: u64, chain: u32) -> ChaCha8Rng {
    if chain == 0 {
        return ChaCha8Rng::seed_from_u64(seed);
    }
    let s = seed ^ (chain as u64).rotate_left(17) ^ 0x9E37_79B9_7F4A_7C15;
    ChaCha8Rng::seed_from_u64(s)
}

/// Runs `params.chains` independent annealing chains and keeps the best one.
///
/// Chain 0 is seeded with `params.seed` itself, so adding chains never makes
/// the result worse than a single run with the same seed.
pub fn optimize(
    schedule: &mut Schedule,
    params: &OptimizeParams,
    weights: &MetricWeights,
    difficulty: &dyn Difficulty,
) -> OptimizationStats {
    let chains = params.chains.max(1);
    info!(
        "optimizing {} lessons: {} iterations x {} chains",
        schedule.len(),
        params.max_iterations,
        chains
    );

    if chains == 1 {
        let stats = Annealer::new(params, *weights, difficulty, chain_rng(params.seed, 0)).run(schedule);
        info!(
            initial = stats.initial_metric,
            final_metric = stats.final_metric,
            improvements = stats.improvements,
            "optimization finished"
        );
        return stats;
    }

    let start = &*schedule;
    let winner = (0..chains)
        .into_par_iter()
        .map(|k| {
            let mut copy = start.clone();
            let rng = chain_rng(params.seed, k);
            let mut stats = Annealer::new(params, *weights, difficulty, rng).run(&mut copy);
            stats.best_chain = k;
            (copy, stats)
        })
        .min_by(|(_, a), (_, b)| {
            a.final_metric
                .total_cmp(&b.final_metric)
                .then(a.best_chain.cmp(&b.best_chain))
        });
    let Some((best, mut stats)) = winner else {
        return Annealer::new(params, *weights, difficulty, chain_rng(params.seed, 0)).run(schedule);
    };
    stats.chains = chains;
    *schedule = best;

    info!(
        initial = stats.initial_metric,
        final_metric = stats.final_metric,
        best_chain = stats.best_chain,
        "optimization finished"
    );
    stats
}
