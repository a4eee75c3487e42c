use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::json;

use super::domain::{CostBracket, DerivedFeatures, PermitSubmission};
use super::model::{Predictor, StagedPredictor};
use super::service::{EstimateError, EstimateOutcome, PermitEstimatorService, StratifiedOutcome};

/// Router exposing the estimate endpoints, the option catalog, and the form.
pub fn estimator_router<B, S>(service: Arc<PermitEstimatorService<B, S>>) -> Router
where
    B: Predictor + 'static,
    S: StagedPredictor + 'static,
{
    Router::new()
        .route("/", get(form_page))
        .route("/api/v1/permits/estimate", post(estimate_handler::<B, S>))
        .route(
            "/api/v1/permits/estimate/stratified",
            post(estimate_stratified_handler::<B, S>),
        )
        .route("/api/v1/permits/options", get(options_handler::<B, S>))
        .with_state(service)
}

/// Summary of the engineered features echoed in the diagnostic panel.
///
/// The build-duration ratio is deliberately absent: it may be NaN, feeds no
/// model, and JSON has no encoding for it.
#[derive(Debug, Serialize)]
pub(crate) struct DerivedView {
    approval_duration: i64,
    completion_duration: i64,
    sqft_per_unit: f64,
    applied_year: i32,
    community_top: String,
    contractor_top: String,
}

impl From<&DerivedFeatures> for DerivedView {
    fn from(derived: &DerivedFeatures) -> Self {
        Self {
            approval_duration: derived.approval_duration,
            completion_duration: derived.completion_duration,
            sqft_per_unit: derived.sqft_per_unit,
            applied_year: derived.applied_year,
            community_top: derived.community_top.clone(),
            contractor_top: derived.contractor_top.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct EstimateResponse {
    permit_number: String,
    estimated_cost: f64,
    log_cost: f64,
    derived: DerivedView,
}

impl From<EstimateOutcome> for EstimateResponse {
    fn from(outcome: EstimateOutcome) -> Self {
        Self {
            permit_number: outcome.permit_number,
            estimated_cost: round2(outcome.estimate.cost),
            log_cost: round4(outcome.estimate.log_cost),
            derived: DerivedView::from(&outcome.derived),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StratifiedResponse {
    permit_number: String,
    bracket: CostBracket,
    estimated_cost: f64,
    diagnostics: StratifiedDiagnosticsView,
    derived: DerivedView,
}

#[derive(Debug, Serialize)]
pub(crate) struct StratifiedDiagnosticsView {
    first_pass_log_cost: f64,
    first_pass_cost: f64,
    final_log_cost: f64,
    final_cost: f64,
}

impl From<StratifiedOutcome> for StratifiedResponse {
    fn from(outcome: StratifiedOutcome) -> Self {
        let diag = outcome.estimate.diagnostics;
        Self {
            permit_number: outcome.permit_number,
            bracket: outcome.estimate.bracket,
            estimated_cost: round2(outcome.estimate.cost),
            diagnostics: StratifiedDiagnosticsView {
                first_pass_log_cost: round4(diag.first_pass_log_cost),
                first_pass_cost: round2(diag.first_pass_cost),
                final_log_cost: round4(diag.final_log_cost),
                final_cost: round2(diag.final_cost),
            },
            derived: DerivedView::from(&outcome.derived),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

async fn form_page() -> Html<&'static str> {
    Html(include_str!("../../assets/form.html"))
}

pub(crate) async fn estimate_handler<B, S>(
    State(service): State<Arc<PermitEstimatorService<B, S>>>,
    axum::Json(submission): axum::Json<PermitSubmission>,
) -> Response
where
    B: Predictor + 'static,
    S: StagedPredictor + 'static,
{
    match service.estimate(&submission) {
        Ok(outcome) => {
            (StatusCode::OK, axum::Json(EstimateResponse::from(outcome))).into_response()
        }
        Err(error) => reject(error),
    }
}

pub(crate) async fn estimate_stratified_handler<B, S>(
    State(service): State<Arc<PermitEstimatorService<B, S>>>,
    axum::Json(submission): axum::Json<PermitSubmission>,
) -> Response
where
    B: Predictor + 'static,
    S: StagedPredictor + 'static,
{
    match service.estimate_stratified(&submission) {
        Ok(outcome) => (
            StatusCode::OK,
            axum::Json(StratifiedResponse::from(outcome)),
        )
            .into_response(),
        Err(error) => reject(error),
    }
}

pub(crate) async fn options_handler<B, S>(
    State(service): State<Arc<PermitEstimatorService<B, S>>>,
) -> Response
where
    B: Predictor + 'static,
    S: StagedPredictor + 'static,
{
    (StatusCode::OK, axum::Json(service.catalog().all().clone())).into_response()
}

fn reject(error: EstimateError) -> Response {
    match &error {
        EstimateError::MissingInput { fields } => {
            let payload = json!({
                "error": error.to_string(),
                "missing_fields": fields,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        EstimateError::DateOrder { warnings } => {
            let payload = json!({
                "error": error.to_string(),
                "warnings": warnings
                    .iter()
                    .map(|warning| warning.message())
                    .collect::<Vec<_>>(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        EstimateError::Model(_) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
