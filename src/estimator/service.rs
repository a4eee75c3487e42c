use std::sync::Arc;

use super::catalog::OptionCatalog;
use super::dispatch::{predict_cost, predict_cost_stratified};
use super::domain::{
    CostEstimate, DerivedFeatures, FeatureRecord, PermitSubmission, StratifiedEstimate,
};
use super::features::{derive_features, feature_record};
use super::model::{ModelError, ModelSet, Predictor, StagedPredictor};
use super::validation::{validate_submission, DateOrderWarning};
use tracing::debug;

/// Service composing the option catalog, validation, and model dispatch.
///
/// Both estimate variants run the same validation gate; the catalog and model
/// set are loaded once and shared read-only across requests.
pub struct PermitEstimatorService<B, S> {
    catalog: Arc<OptionCatalog>,
    models: Arc<ModelSet<B, S>>,
}

/// Single-model result echoed back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimateOutcome {
    pub permit_number: String,
    pub estimate: CostEstimate,
    pub derived: DerivedFeatures,
}

/// Stratified result with bracket and two-pass diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct StratifiedOutcome {
    pub permit_number: String,
    pub estimate: StratifiedEstimate,
    pub derived: DerivedFeatures,
}

impl<B, S> PermitEstimatorService<B, S>
where
    B: Predictor + 'static,
    S: StagedPredictor + 'static,
{
    pub fn new(catalog: Arc<OptionCatalog>, models: Arc<ModelSet<B, S>>) -> Self {
        Self { catalog, models }
    }

    pub fn catalog(&self) -> &OptionCatalog {
        &self.catalog
    }

    /// Estimate with the base pipeline only.
    pub fn estimate(
        &self,
        submission: &PermitSubmission,
    ) -> Result<EstimateOutcome, EstimateError> {
        let (derived, record) = self.prepare(submission)?;
        let estimate = predict_cost(&self.models.base, &record)?;
        debug!(
            permit_number = %submission.permit_number,
            cost = estimate.cost,
            "base pipeline estimate"
        );

        Ok(EstimateOutcome {
            permit_number: submission.permit_number.clone(),
            estimate,
            derived,
        })
    }

    /// Estimate with bracket routing: the base pipeline's estimate selects
    /// one of the three specialized pipelines for the final cost.
    pub fn estimate_stratified(
        &self,
        submission: &PermitSubmission,
    ) -> Result<StratifiedOutcome, EstimateError> {
        let (derived, record) = self.prepare(submission)?;
        let estimate = predict_cost_stratified(&self.models, &record)?;
        debug!(
            permit_number = %submission.permit_number,
            bracket = estimate.bracket.label(),
            cost = estimate.cost,
            "stratified estimate"
        );

        Ok(StratifiedOutcome {
            permit_number: submission.permit_number.clone(),
            estimate,
            derived,
        })
    }

    /// Derive features and apply the shared validation gate. No model is
    /// called when the gate rejects the submission.
    fn prepare(
        &self,
        submission: &PermitSubmission,
    ) -> Result<(DerivedFeatures, FeatureRecord), EstimateError> {
        let derived = derive_features(submission, &self.catalog);
        let report = validate_submission(submission, &derived);

        if !report.missing_fields.is_empty() {
            return Err(EstimateError::MissingInput {
                fields: report
                    .missing_fields
                    .iter()
                    .map(|field| field.to_string())
                    .collect(),
            });
        }
        if !report.date_warnings.is_empty() {
            return Err(EstimateError::DateOrder {
                warnings: report.date_warnings,
            });
        }

        let record = feature_record(submission, &derived);
        Ok((derived, record))
    }
}

/// Error raised by the estimator service.
#[derive(Debug, thiserror::Error)]
pub enum EstimateError {
    #[error("please fill in the following required fields: {}", fields.join(", "))]
    MissingInput { fields: Vec<String> },
    #[error("{}", warnings.iter().map(|w| w.message()).collect::<Vec<_>>().join("; "))]
    DateOrder { warnings: Vec<DateOrderWarning> },
    #[error(transparent)]
    Model(#[from] ModelError),
}
