//! Permit cost estimation: feature derivation, required-input validation, and
//! tiered dispatch across the trained regression pipelines.

pub mod catalog;
pub mod dispatch;
pub mod domain;
pub mod features;
pub mod model;
pub mod router;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use catalog::{CatalogError, OptionCatalog};
pub use dispatch::{predict_cost, predict_cost_stratified, MEDIUM_CEILING, SMALL_CEILING};
pub use domain::{
    CostBracket, CostEstimate, DerivedFeatures, FeatureRecord, PermitSubmission,
    StratifiedDiagnostics, StratifiedEstimate,
};
pub use features::{derive_features, feature_record};
pub use model::{LinearModelSet, LinearPipeline, ModelError, ModelSet, Predictor, StagedPredictor};
pub use router::estimator_router;
pub use service::{EstimateError, EstimateOutcome, PermitEstimatorService, StratifiedOutcome};
pub use validation::{validate_submission, DateOrderWarning, ValidationReport};
