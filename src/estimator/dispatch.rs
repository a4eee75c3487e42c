use super::domain::{
    CostBracket, CostEstimate, FeatureRecord, StratifiedDiagnostics, StratifiedEstimate,
};
use super::model::{ModelError, ModelSet, Predictor, StagedPredictor};

/// First-pass estimates strictly below this are routed to the small-bracket
/// pipeline; the boundary itself belongs to medium.
pub const SMALL_CEILING: f64 = 14_000.0;

/// First-pass estimates up to and including this are routed to the
/// medium-bracket pipeline; only strictly larger estimates go to large.
pub const MEDIUM_CEILING: f64 = 170_000.0;

impl CostBracket {
    /// Partition the first-pass estimate into exactly one bracket.
    ///
    /// The brackets are half-open with both 14 000 and 170 000 classified as
    /// medium; the trained bracket pipelines assume this exact boundary
    /// placement.
    pub fn for_estimate(cost: f64) -> Self {
        if cost < SMALL_CEILING {
            CostBracket::Small
        } else if cost <= MEDIUM_CEILING {
            CostBracket::Medium
        } else {
            CostBracket::Large
        }
    }
}

/// Single-model dispatch: one base pipeline call, inverted out of log space.
///
/// All pipelines are trained against `ln_1p`-transformed costs, so `exp_m1`
/// recovers the monetary value.
pub fn predict_cost<B: Predictor>(
    base: &B,
    record: &FeatureRecord,
) -> Result<CostEstimate, ModelError> {
    let log_cost = base.predict(record)?;
    Ok(CostEstimate {
        log_cost,
        cost: log_cost.exp_m1(),
    })
}

/// Stratified dispatch: the base estimate selects a bracket, and the
/// bracket's own pipeline produces the refined final cost.
///
/// Any pipeline failure propagates; no partial result is returned.
pub fn predict_cost_stratified<B, S>(
    models: &ModelSet<B, S>,
    record: &FeatureRecord,
) -> Result<StratifiedEstimate, ModelError>
where
    B: Predictor,
    S: StagedPredictor,
{
    let first_pass = predict_cost(&models.base, record)?;
    let bracket = CostBracket::for_estimate(first_pass.cost);

    let pipeline = models.for_bracket(bracket);
    let encoded = pipeline.transform(record)?;
    let final_log_cost = pipeline.predict_encoded(&encoded)?;
    let final_cost = final_log_cost.exp_m1();

    Ok(StratifiedEstimate {
        bracket,
        cost: final_cost,
        diagnostics: StratifiedDiagnostics {
            first_pass_log_cost: first_pass.log_cost,
            first_pass_cost: first_pass.cost,
            final_log_cost,
            final_cost,
        },
    })
}
