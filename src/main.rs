use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use permit_estimator::config::AppConfig;
use permit_estimator::error::AppError;
use permit_estimator::estimator::{
    estimator_router, DerivedFeatures, LinearPipeline, ModelSet, OptionCatalog,
    PermitEstimatorService, PermitSubmission,
};
use permit_estimator::telemetry;
use serde_json::json;
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
    name = "Building Permit Cost Estimator",
    about = "Serve or run one-shot building-permit project cost estimates",
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
    /// Run a one-shot estimate from a JSON submission file
    Estimate(EstimateArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
    /// Directory holding the model pipelines and option catalog
    #[arg(long)]
    artifact_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct EstimateArgs {
    /// Path to a JSON permit submission
    input: PathBuf,
    /// Route through the bracket-specific pipelines
    #[arg(long)]
    stratified: bool,
    /// Directory holding the model pipelines and option catalog
    #[arg(long)]
    artifact_dir: Option<PathBuf>,
}

type LinearService = PermitEstimatorService<LinearPipeline, LinearPipeline>;

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
        Command::Estimate(args) => run_estimate(args),
    }
}

/// Load the prediction context once: catalog and pipelines from the artifact
/// directory when one is configured, the embedded demo set otherwise.
fn build_service(artifact_dir: Option<&Path>) -> Result<Arc<LinearService>, AppError> {
    let (catalog, models) = match artifact_dir {
        Some(dir) => (
            OptionCatalog::from_path(&dir.join("options.csv"))?,
            ModelSet::load(dir)?,
        ),
        None => (OptionCatalog::demo(), ModelSet::demo()),
    };

    Ok(Arc::new(PermitEstimatorService::new(
        Arc::new(catalog),
        Arc::new(models),
    )))
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(dir) = args.artifact_dir.take() {
        config.artifacts.dir = Some(dir);
    }

    telemetry::init(&config.telemetry)?;

    let service = build_service(config.artifacts.dir.as_deref())?;

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
        .merge(estimator_router(service))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "permit cost estimator ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_estimate(args: EstimateArgs) -> Result<(), AppError> {
    let EstimateArgs {
        input,
        stratified,
        artifact_dir,
    } = args;

    let config = AppConfig::load()?;
    let artifact_dir = artifact_dir.or(config.artifacts.dir);
    let service = build_service(artifact_dir.as_deref())?;

    let raw = std::fs::read_to_string(&input)?;
    let submission: PermitSubmission = serde_json::from_str(&raw)?;

    if stratified {
        let outcome = service.estimate_stratified(&submission)?;
        render_header(&outcome.permit_number, &outcome.derived);
        println!(
            "Predicted cost bracket: {}",
            outcome.estimate.bracket.label()
        );
        println!(
            "Estimated project cost: ${}",
            group_thousands(outcome.estimate.cost)
        );
        let diag = outcome.estimate.diagnostics;
        println!("\nDiagnostics");
        println!(
            "- first pass: log cost {:.4}, cost ${}",
            diag.first_pass_log_cost,
            group_thousands(diag.first_pass_cost)
        );
        println!(
            "- final:      log cost {:.4}, cost ${}",
            diag.final_log_cost,
            group_thousands(diag.final_cost)
        );
    } else {
        let outcome = service.estimate(&submission)?;
        render_header(&outcome.permit_number, &outcome.derived);
        println!(
            "Estimated project cost: ${}",
            group_thousands(outcome.estimate.cost)
        );
        println!("Log cost: {:.4}", outcome.estimate.log_cost);
    }

    Ok(())
}

fn render_header(permit_number: &str, derived: &DerivedFeatures) {
    println!("Permit {permit_number}");
    println!(
        "Approval {} days, completion {} days, applied year {}",
        derived.approval_duration, derived.completion_duration, derived.applied_year
    );
    println!(
        "Community (folded): {}, contractor (folded): {}",
        derived.community_top, derived.contractor_top
    );
    println!();
}

/// Format a monetary value with thousands separators, two decimals.
fn group_thousands(value: f64) -> String {
    let formatted = format!("{value:.2}");
    let (integral, decimals) = formatted.split_once('.').unwrap_or((&formatted, "00"));
    let (sign, digits) = match integral.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", integral),
    };

    let mut grouped = String::new();
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{sign}{grouped}.{decimals}")
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
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
