use jobs::InMemJobs;
use pipeline::TimetablePipeline;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<InMemJobs<TimetablePipeline>>,
}

impl AppState {
    pub fn new_default() -> Self {
        Self {
            jobs: Arc::new(InMemJobs::new(TimetablePipeline::new())),
        }
    }
}
