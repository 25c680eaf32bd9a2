use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use serde_json::json;
use skillgauge::config::AppConfig;
use skillgauge::error::AppError;
use skillgauge::telemetry;
use skillgauge::workflows::assessment::{
    aggregate_across_assessors, assessment_router, evaluation_from_json, pivot_by_module,
    summarize_evaluation, AssessmentAggregate, AssessmentService, EvaluationSummary,
    InMemoryAssessmentStore, NullChannel,
};
use skillgauge::workflows::matrix::{parse_matrix, parse_profiles, CompetencyMatrix, Profile};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "Skillgauge",
    about = "Score technical interview assessments against a weighted competency matrix",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Work with assessments offline
    Assessment {
        #[command(subcommand)]
        command: AssessmentCommand,
    },
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum AssessmentCommand {
    /// Compute per-evaluation and cross-assessor summaries from exported files
    Summary(SummaryArgs),
}

#[derive(Args, Debug)]
struct SummaryArgs {
    /// Competency matrix CSV (one row per topic)
    #[arg(long)]
    matrix: PathBuf,
    /// Profile catalog CSV
    #[arg(long)]
    profiles: PathBuf,
    /// Profile the evaluations were scored against
    #[arg(long)]
    profile_id: String,
    /// Evaluation record JSON exports, one per assessor (repeatable)
    #[arg(long = "evaluation", required = true)]
    evaluations: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
struct SummaryOutput {
    evaluations: Vec<EvaluationSummary>,
    aggregate: AssessmentAggregate,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Assessment {
            command: AssessmentCommand::Summary(args),
        } => run_summary(args),
    }
}

fn load_matrix(path: &Path) -> Result<CompetencyMatrix, AppError> {
    let file = File::open(path)?;
    Ok(parse_matrix(file)?)
}

fn load_profiles(path: &Path) -> Result<Vec<Profile>, AppError> {
    let file = File::open(path)?;
    Ok(parse_profiles(file)?)
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let matrix = Arc::new(load_matrix(&config.data.matrix_path)?);
    let profiles = load_profiles(&config.data.profiles_path)?;
    info!(
        modules = matrix.modules.len(),
        profiles = profiles.len(),
        "competency matrix loaded"
    );

    let service = Arc::new(AssessmentService::new(
        matrix,
        profiles,
        Arc::new(InMemoryAssessmentStore::new()),
        Arc::new(NullChannel),
    ));

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .merge(assessment_router(service))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "assessment scoring service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_summary(args: SummaryArgs) -> Result<(), AppError> {
    let matrix = load_matrix(&args.matrix)?;
    let profiles = load_profiles(&args.profiles)?;
    let profile = profiles
        .into_iter()
        .find(|profile| profile.id.0 == args.profile_id)
        .ok_or_else(|| AppError::UnknownProfile(args.profile_id.clone()))?;

    let mut records = Vec::new();
    for path in &args.evaluations {
        let raw = std::fs::read_to_string(path)?;
        records.push(evaluation_from_json(&raw)?);
    }

    let evaluations = records
        .iter()
        .map(|record| summarize_evaluation(record, &matrix, &profile))
        .collect();

    let module_major = pivot_by_module(&records, &matrix, &profile);
    let aggregate = aggregate_across_assessors(&module_major, &matrix, &profile);

    let output = SummaryOutput {
        evaluations,
        aggregate,
    };
    let rendered = serde_json::to_string_pretty(&output)
        .map_err(skillgauge::workflows::assessment::ExportError::from)?;
    println!("{rendered}");

    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
