mod error;
mod state;
mod telemetry;
pub mod routes {
    pub mod explain;
    pub mod generate;
    pub mod health;
    pub mod jobs;
    pub mod validate;
}

use axum::{
    routing::{get, post},
    Router,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

const PORT_VAR: &str = "TIMETABLE__SERVER__PORT";
const DEFAULT_PORT: u16 = 8080;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::health::health,
        routes::validate::validate_handler,
        routes::generate::generate,
        routes::jobs::status,
        routes::jobs::result,
        routes::explain::explain,
    ),
    components(schemas(
        types::Instance, types::Classroom, types::Teacher, types::Subject, types::SubjectKind,
        types::Lesson, types::TimeSlot, types::DayOfWeek, types::TeacherId, types::ClassroomId,
        types::MetricWeights, types::OptimizeParams, types::GenerateParams,
        types::GenerateEnvelope, types::GenerateResult, types::GenerateStatus,
        types::PlacementReport, types::Shortfall, types::OptimizationStats, types::BestPoint,
        types::QualityReport, types::DayLoad, types::EntityGaps,
        jobs::JobId, jobs::JobStatus,
        routes::validate::ValidationReport,
        routes::generate::JobCreated,
        routes::explain::ExplainIn,
    )),
    tags(
        (name = "timetable", description = "School timetable generation API")
    )
)]
struct ApiDoc;

fn app(state: state::AppState) -> Router {
    let router = Router::new()
        .route("/v1/health", get(routes::health::health))
        .route("/v1/validate", post(routes::validate::validate_handler))
        .route("/v1/generate", post(routes::generate::generate))
        .route("/v1/explain", post(routes::explain::explain))
        .route("/v1/jobs/:id", get(routes::jobs::status))
        .route("/v1/jobs/:id/result", get(routes::jobs::result))
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .with_state(state);
    telemetry::wrap(router)
}

fn listen_port() -> anyhow::Result<u16> {
    match std::env::var(PORT_VAR) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("{PORT_VAR}={raw} is not a port: {e}")),
        Err(_) => Ok(DEFAULT_PORT),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], listen_port()?));
    tracing::info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state::AppState::new_default()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
