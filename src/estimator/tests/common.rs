use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::to_bytes;
use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::estimator::catalog::OptionCatalog;
use crate::estimator::domain::{FeatureRecord, PermitSubmission};
use crate::estimator::model::{ModelError, ModelSet, Predictor, StagedPredictor};
use crate::estimator::service::PermitEstimatorService;

pub(super) async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    serde_json::from_slice(&bytes).expect("body is json")
}

pub(super) fn catalog() -> OptionCatalog {
    let csv = "\
field,value
StatusCurrent_Top,Completed
StatusCurrent_Top,Issued
PermitType,Commercial / Multi Family Project
PermitType,Residential Improvement Project
PermitTypeMapped,Commercial
PermitTypeMapped,Residential
PermitClass_Top,1112 - Single Family House
PermitClass_Top,Other
PermitClassGroup,Non-Residential
PermitClassGroup,Residential
PermitClassMapped,Residential
WorkClass,Alteration
WorkClass,New
WorkClassGroup,Existing
WorkClassGroup,New
WorkClassMapped,New
CommunityName_all,BELTLINE
CommunityName_all,SILVERADO
CommunityName_Top,BELTLINE
ContractorName_all,Cardel Homes
ContractorName_all,Local Builder
ContractorName_Top,Cardel Homes
";
    OptionCatalog::from_reader(csv.as_bytes()).expect("test catalog parses")
}

pub(super) fn submission() -> PermitSubmission {
    PermitSubmission {
        permit_number: "BP2013-09623".to_string(),
        status: "Completed".to_string(),
        permit_type: "Residential Improvement Project".to_string(),
        permit_type_mapped: "Residential".to_string(),
        permit_class_top: "1112 - Single Family House".to_string(),
        permit_class_group: "Residential".to_string(),
        permit_class_mapped: "Residential".to_string(),
        work_class: "New".to_string(),
        work_class_group: "New".to_string(),
        work_class_mapped: "New".to_string(),
        applied_date: NaiveDate::from_ymd_opt(2020, 1, 1).expect("valid date"),
        issued_date: NaiveDate::from_ymd_opt(2020, 2, 1).expect("valid date"),
        completed_date: NaiveDate::from_ymd_opt(2020, 4, 1).expect("valid date"),
        total_sqft: 1732,
        housing_units: 1,
        location_count: 2,
        community_name: "BELTLINE".to_string(),
        contractor_name: "Cardel Homes".to_string(),
        applicant_name: "J. Doe".to_string(),
        address: "123 4 Ave SW".to_string(),
        description: "Basement development".to_string(),
    }
}

/// Base-pipeline stub returning a fixed log-scale cost and counting calls.
#[derive(Debug, Default)]
pub(super) struct FixedPredictor {
    pub(super) log_cost: f64,
    pub(super) calls: Arc<AtomicUsize>,
}

impl FixedPredictor {
    pub(super) fn returning(log_cost: f64) -> Self {
        Self {
            log_cost,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(super) fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl Predictor for FixedPredictor {
    fn predict(&self, _record: &FeatureRecord) -> Result<f64, ModelError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.log_cost)
    }
}

/// Bracket-pipeline stub with the two-stage transform/predict contract.
#[derive(Debug)]
pub(super) struct FixedStaged {
    pub(super) log_cost: f64,
}

impl StagedPredictor for FixedStaged {
    fn transform(&self, _record: &FeatureRecord) -> Result<Vec<f64>, ModelError> {
        Ok(vec![1.0])
    }

    fn predict_encoded(&self, _encoded: &[f64]) -> Result<f64, ModelError> {
        Ok(self.log_cost)
    }
}

/// Stub whose predict always fails, for propagation tests.
#[derive(Debug)]
pub(super) struct FailingPredictor;

impl Predictor for FailingPredictor {
    fn predict(&self, _record: &FeatureRecord) -> Result<f64, ModelError> {
        Err(ModelError::UnknownColumn {
            column: "PermitType".to_string(),
        })
    }
}

impl StagedPredictor for FailingPredictor {
    fn transform(&self, _record: &FeatureRecord) -> Result<Vec<f64>, ModelError> {
        Err(ModelError::UnknownColumn {
            column: "PermitType".to_string(),
        })
    }

    fn predict_encoded(&self, _encoded: &[f64]) -> Result<f64, ModelError> {
        Err(ModelError::UnknownColumn {
            column: "PermitType".to_string(),
        })
    }
}

/// Log-scale value whose `exp_m1` lands on the requested monetary cost.
pub(super) fn log_for_cost(cost: f64) -> f64 {
    cost.ln_1p()
}

/// Model set whose base pipeline estimates `base_cost` and whose bracket
/// pipelines return distinguishable costs, so routing is observable.
pub(super) fn stub_models(base_cost: f64) -> ModelSet<FixedPredictor, FixedStaged> {
    ModelSet {
        base: FixedPredictor::returning(log_for_cost(base_cost)),
        small: FixedStaged {
            log_cost: log_for_cost(1_000.0),
        },
        medium: FixedStaged {
            log_cost: log_for_cost(50_000.0),
        },
        large: FixedStaged {
            log_cost: log_for_cost(500_000.0),
        },
    }
}

pub(super) fn stub_service(
    base_cost: f64,
) -> PermitEstimatorService<FixedPredictor, FixedStaged> {
    PermitEstimatorService::new(Arc::new(catalog()), Arc::new(stub_models(base_cost)))
}
