use super::domain::{CostBracket, FeatureRecord};
use serde::Deserialize;
use std::path::Path;

/// Boundary for the opaque base pipeline: one call, one log-scale cost.
pub trait Predictor: Send + Sync {
    fn predict(&self, record: &FeatureRecord) -> Result<f64, ModelError>;
}

/// Boundary for the bracket pipelines, which expose their preprocessing step
/// separately: encode the record, then score the encoded row.
pub trait StagedPredictor: Send + Sync {
    fn transform(&self, record: &FeatureRecord) -> Result<Vec<f64>, ModelError>;
    fn predict_encoded(&self, encoded: &[f64]) -> Result<f64, ModelError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed model artifact: {0}")]
    Artifact(#[from] serde_json::Error),
    #[error("artifact declares non-positive scale for numeric column '{column}'")]
    Scale { column: String },
    #[error("pipeline references unknown feature column '{column}'")]
    UnknownColumn { column: String },
    #[error("encoded feature width mismatch: model expects {expected}, preprocessor produced {actual}")]
    FeatureWidth { expected: usize, actual: usize },
}

/// One-hot parameters for a single categorical column.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoricalEncoding {
    pub name: String,
    pub categories: Vec<String>,
}

/// Standard-scaling parameters for a single numeric column.
#[derive(Debug, Clone, Deserialize)]
pub struct NumericScaling {
    pub name: String,
    pub mean: f64,
    pub scale: f64,
}

/// The fitted preprocessing step: one-hot categoricals (unknown values encode
/// to all zeros) followed by standard-scaled numerics, in artifact order.
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureEncoder {
    pub categorical: Vec<CategoricalEncoding>,
    pub numeric: Vec<NumericScaling>,
}

impl FeatureEncoder {
    fn width(&self) -> usize {
        let one_hot: usize = self
            .categorical
            .iter()
            .map(|column| column.categories.len())
            .sum();
        one_hot + self.numeric.len()
    }

    fn encode(&self, record: &FeatureRecord) -> Result<Vec<f64>, ModelError> {
        let mut encoded = Vec::with_capacity(self.width());

        for column in &self.categorical {
            let value =
                record
                    .categorical(&column.name)
                    .ok_or_else(|| ModelError::UnknownColumn {
                        column: column.name.clone(),
                    })?;
            for category in &column.categories {
                encoded.push(if category == value { 1.0 } else { 0.0 });
            }
        }

        for column in &self.numeric {
            let value = record
                .numeric(&column.name)
                .ok_or_else(|| ModelError::UnknownColumn {
                    column: column.name.clone(),
                })?;
            encoded.push((value - column.mean) / column.scale);
        }

        Ok(encoded)
    }
}

/// The fitted regressor: a dot product over the encoded row plus intercept,
/// producing the log-scale cost.
#[derive(Debug, Clone, Deserialize)]
pub struct LinearModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearModel {
    fn score(&self, encoded: &[f64]) -> Result<f64, ModelError> {
        if encoded.len() != self.coefficients.len() {
            return Err(ModelError::FeatureWidth {
                expected: self.coefficients.len(),
                actual: encoded.len(),
            });
        }

        let dot: f64 = self
            .coefficients
            .iter()
            .zip(encoded)
            .map(|(coefficient, value)| coefficient * value)
            .sum();
        Ok(self.intercept + dot)
    }
}

/// A trained two-stage pipeline loaded from a JSON artifact.
#[derive(Debug, Clone, Deserialize)]
pub struct LinearPipeline {
    pub preprocessor: FeatureEncoder,
    pub model: LinearModel,
}

impl LinearPipeline {
    pub fn from_json(raw: &str) -> Result<Self, ModelError> {
        let pipeline: Self = serde_json::from_str(raw)?;
        pipeline.check()?;
        Ok(pipeline)
    }

    pub fn from_path(path: &Path) -> Result<Self, ModelError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    fn check(&self) -> Result<(), ModelError> {
        for column in &self.preprocessor.numeric {
            if !(column.scale.is_finite() && column.scale > 0.0) {
                return Err(ModelError::Scale {
                    column: column.name.clone(),
                });
            }
        }

        let width = self.preprocessor.width();
        if width != self.model.coefficients.len() {
            return Err(ModelError::FeatureWidth {
                expected: self.model.coefficients.len(),
                actual: width,
            });
        }

        Ok(())
    }
}

impl Predictor for LinearPipeline {
    fn predict(&self, record: &FeatureRecord) -> Result<f64, ModelError> {
        let encoded = self.preprocessor.encode(record)?;
        self.model.score(&encoded)
    }
}

impl StagedPredictor for LinearPipeline {
    fn transform(&self, record: &FeatureRecord) -> Result<Vec<f64>, ModelError> {
        self.preprocessor.encode(record)
    }

    fn predict_encoded(&self, encoded: &[f64]) -> Result<f64, ModelError> {
        self.model.score(encoded)
    }
}

/// Every pipeline a deployment needs: the base estimator plus one specialized
/// regressor per cost bracket. Immutable after load.
#[derive(Debug, Clone)]
pub struct ModelSet<B, S> {
    pub base: B,
    pub small: S,
    pub medium: S,
    pub large: S,
}

pub type LinearModelSet = ModelSet<LinearPipeline, LinearPipeline>;

impl<B, S> ModelSet<B, S> {
    pub fn for_bracket(&self, bracket: CostBracket) -> &S {
        match bracket {
            CostBracket::Small => &self.small,
            CostBracket::Medium => &self.medium,
            CostBracket::Large => &self.large,
        }
    }
}

impl LinearModelSet {
    /// Load `base.json`, `small.json`, `medium.json`, and `large.json` from an
    /// artifact directory.
    pub fn load(dir: &Path) -> Result<Self, ModelError> {
        Ok(Self {
            base: LinearPipeline::from_path(&dir.join("base.json"))?,
            small: LinearPipeline::from_path(&dir.join("small.json"))?,
            medium: LinearPipeline::from_path(&dir.join("medium.json"))?,
            large: LinearPipeline::from_path(&dir.join("large.json"))?,
        })
    }

    /// The built-in demo pipelines used when no artifact directory is set.
    /// Coefficients are illustrative, not trained.
    pub fn demo() -> Self {
        let load = |raw: &str| {
            LinearPipeline::from_json(raw).expect("embedded demo pipeline is well formed")
        };
        Self {
            base: load(include_str!("../../assets/models/base.json")),
            small: load(include_str!("../../assets/models/small.json")),
            medium: load(include_str!("../../assets/models/medium.json")),
            large: load(include_str!("../../assets/models/large.json")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> FeatureRecord {
        FeatureRecord {
            permit_type: "Residential Improvement Project".to_string(),
            permit_class_top: "1112 - Single Family House".to_string(),
            permit_class_group: "Residential".to_string(),
            work_class: "New".to_string(),
            work_class_group: "New".to_string(),
            work_class_mapped: "New".to_string(),
            status_current_top: "Completed".to_string(),
            total_sqft: 1732,
            housing_units: 1,
            sqft_per_unit: 1732.0,
            applied_year: 2020,
            approval_duration: 31,
            completion_duration: 60,
            location_count: 2,
            community_name_top: "BELTLINE".to_string(),
            contractor_name_top: "Other".to_string(),
        }
    }

    fn pipeline() -> LinearPipeline {
        LinearPipeline {
            preprocessor: FeatureEncoder {
                categorical: vec![CategoricalEncoding {
                    name: "WorkClass".to_string(),
                    categories: vec!["Alteration".to_string(), "New".to_string()],
                }],
                numeric: vec![NumericScaling {
                    name: "TotalSqFt".to_string(),
                    mean: 1000.0,
                    scale: 500.0,
                }],
            },
            model: LinearModel {
                coefficients: vec![0.1, 0.4, 0.25],
                intercept: 9.0,
            },
        }
    }

    #[test]
    fn encodes_one_hot_then_scaled_numerics() {
        let encoded = pipeline().transform(&record()).expect("encodes");
        assert_eq!(encoded, vec![0.0, 1.0, (1732.0 - 1000.0) / 500.0]);
    }

    #[test]
    fn unknown_category_encodes_to_all_zeros() {
        let mut record = record();
        record.work_class = "Demolition".to_string();
        let encoded = pipeline().transform(&record).expect("encodes");
        assert_eq!(&encoded[..2], &[0.0, 0.0]);
    }

    #[test]
    fn predict_is_intercept_plus_dot_product() {
        let log_cost = pipeline().predict(&record()).expect("predicts");
        let expected = 9.0 + 0.4 + 0.25 * ((1732.0 - 1000.0) / 500.0);
        assert!((log_cost - expected).abs() < 1e-12);
    }

    #[test]
    fn width_mismatch_is_an_inference_error() {
        let pipeline = pipeline();
        match pipeline.predict_encoded(&[1.0, 0.0]) {
            Err(ModelError::FeatureWidth { expected, actual }) => {
                assert_eq!(expected, 3);
                assert_eq!(actual, 2);
            }
            other => panic!("expected width mismatch, got {other:?}"),
        }
    }

    #[test]
    fn artifact_with_bad_width_is_rejected_at_load() {
        let raw = serde_json::json!({
            "preprocessor": {
                "categorical": [],
                "numeric": [{ "name": "TotalSqFt", "mean": 0.0, "scale": 1.0 }]
            },
            "model": { "coefficients": [0.1, 0.2], "intercept": 0.0 }
        })
        .to_string();

        match LinearPipeline::from_json(&raw) {
            Err(ModelError::FeatureWidth { expected, actual }) => {
                assert_eq!(expected, 2);
                assert_eq!(actual, 1);
            }
            other => panic!("expected width mismatch, got {other:?}"),
        }
    }

    #[test]
    fn artifact_with_zero_scale_is_rejected_at_load() {
        let raw = serde_json::json!({
            "preprocessor": {
                "categorical": [],
                "numeric": [{ "name": "TotalSqFt", "mean": 0.0, "scale": 0.0 }]
            },
            "model": { "coefficients": [0.1], "intercept": 0.0 }
        })
        .to_string();

        assert!(matches!(
            LinearPipeline::from_json(&raw),
            Err(ModelError::Scale { .. })
        ));
    }

    #[test]
    fn demo_set_loads_and_predicts() {
        let models = LinearModelSet::demo();
        let log_cost = models.base.predict(&record()).expect("demo base predicts");
        assert!(log_cost.is_finite());
    }
}
