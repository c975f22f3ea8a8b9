use parking_lot::RwLock;
use sched_core::Generator;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, error, info};
use types::{GenerateEnvelope, GenerateResult};
use utoipa::ToSchema;
use uuid::Uuid;

/// Finished jobs kept by [`InMemJobs::new`] before the oldest are dropped.
pub const DEFAULT_RETAINED_JOBS: usize = 1024;

#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, ToSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Solved { result: GenerateResult },
    Failed { message: String },
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Solved { .. } | JobStatus::Failed { .. })
    }
}

#[derive(Debug, Default)]
struct JobTable {
    statuses: HashMap<String, JobStatus>,
    finished: VecDeque<String>,
}

impl JobTable {
    /// Records a terminal status and drops the oldest finished jobs beyond `retain`.
    fn finish(&mut self, id: String, status: JobStatus, retain: usize) {
        self.statuses.insert(id.clone(), status);
        self.finished.push_back(id);
        while self.finished.len() > retain {
            if let Some(old) = self.finished.pop_front() {
                debug!(job = %old, "evicting finished job");
                self.statuses.remove(&old);
            }
        }
    }
}

/// Runs generation requests in the background and keeps their outcome in memory.
///
/// Queued and running jobs are always kept; only the most recent `retain`
/// finished ones stay queryable.
pub struct InMemJobs<G: Generator> {
    inner: Arc<RwLock<JobTable>>,
    generator: Arc<G>,
    retain: usize,
}

impl<G: Generator> Clone for InMemJobs<G> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            generator: self.generator.clone(),
            retain: self.retain,
        }
    }
}

impl<G: Generator> InMemJobs<G> {
    pub fn new(generator: G) -> Self {
        Self::with_retention(generator, DEFAULT_RETAINED_JOBS)
    }

    pub fn with_retention(generator: G, retain: usize) -> Self {
        Self {
            inner: Default::default(),
            generator: Arc::new(generator),
            retain,
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn enqueue(&self, env: GenerateEnvelope) -> JobId {
        let id = Uuid::new_v4().to_string();
        self.inner.write().statuses.insert(id.clone(), JobStatus::Queued);

        let table = self.inner.clone();
        let generator = self.generator.clone();
        let retain = self.retain;
        let id_for_task = id.clone();

        tokio::spawn(async move {
            table
                .write()
                .statuses
                .insert(id_for_task.clone(), JobStatus::Running);
            let status = match generator.generate(env).await {
                Ok(result) => {
                    info!(job = %id_for_task, status = ?result.status, "job finished");
                    JobStatus::Solved { result }
                }
                Err(e) => {
                    error!(job = %id_for_task, error = %e, "job failed");
                    JobStatus::Failed {
                        message: format!("{e:#}"),
                    }
                }
            };
            table.write().finish(id_for_task, status, retain);
        });

        JobId(id)
    }

    pub fn get(&self, id: &str) -> Option<JobStatus> {
        self.inner.read().statuses.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;
    use types::{GenerateStatus, Instance, PlacementReport, QualityReport};

    struct Echo;

    #[async_trait]
    impl Generator for Echo {
        async fn generate(&self, env: GenerateEnvelope) -> anyhow::Result<GenerateResult> {
            if env.instance.teachers.is_empty() {
                anyhow::bail!("no teachers");
            }
            Ok(GenerateResult {
                status: GenerateStatus::Solved,
                lessons: env.base,
                placement: PlacementReport::default(),
                optimization: None,
                quality: QualityReport {
                    total_lessons: 0,
                    exam_practice_lessons: 0,
                    mandatory_lessons: 0,
                    teacher_gaps: 0,
                    class_gaps: 0,
                    daily_load: vec![],
                    load_stddev: 0.0,
                    bad_timing: 0,
                    metric: 0.0,
                    worst_teachers: vec![],
                    placement_rate: None,
                },
            })
        }
    }

    fn envelope(teachers: usize) -> GenerateEnvelope {
        let mut instance = Instance::default();
        for i in 0..teachers {
            instance.teachers.push(types::Teacher {
                name: format!("t{i}").as_str().into(),
                available_days: types::DayOfWeek::weekdays(),
                home_classroom: None,
            });
        }
        GenerateEnvelope {
            instance,
            base: vec![],
            reserved: vec![],
            params: Default::default(),
        }
    }

    async fn wait(jobs: &InMemJobs<Echo>, id: &JobId) -> JobStatus {
        for _ in 0..200 {
            if let Some(st) = jobs.get(&id.0) {
                if st.is_finished() {
                    return st;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("job {} did not finish", id.0);
    }

    #[tokio::test]
    async fn job_reaches_solved() {
        let jobs = InMemJobs::new(Echo);
        let id = jobs.enqueue(envelope(1));
        assert!(jobs.get(&id.0).is_some());

        let st = wait(&jobs, &id).await;
        assert!(matches!(st, JobStatus::Solved { ref result } if result.status == GenerateStatus::Solved));
        assert_eq!(jobs.len(), 1);
    }

    #[tokio::test]
    async fn failure_is_kept_with_its_message() {
        let jobs = InMemJobs::new(Echo);
        let id = jobs.enqueue(envelope(0));

        let st = wait(&jobs, &id).await;
        let JobStatus::Failed { message } = &st else {
            panic!("expected failure, got {st:?}");
        };
        assert_eq!(message, "no teachers");

        let json = serde_json::to_value(&st).unwrap();
        assert_eq!(json["status"], "failed");
    }

    #[tokio::test]
    async fn oldest_finished_jobs_are_evicted() {
        let jobs = InMemJobs::with_retention(Echo, 2);
        let first = jobs.enqueue(envelope(1));
        wait(&jobs, &first).await;
        let second = jobs.enqueue(envelope(0));
        wait(&jobs, &second).await;
        let third = jobs.enqueue(envelope(1));
        wait(&jobs, &third).await;

        assert!(jobs.get(&first.0).is_none());
        assert!(matches!(jobs.get(&second.0), Some(JobStatus::Failed { .. })));
        assert!(matches!(jobs.get(&third.0), Some(JobStatus::Solved { .. })));
        assert_eq!(jobs.len(), 2);
    }

    #[test]
    fn unknown_job_is_none() {
        let jobs = InMemJobs::new(Echo);
        assert!(jobs.get("nope").is_none());
        assert!(jobs.is_empty());
    }
}
