use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Raw permit attributes supplied by the caller, one per estimate request.
///
/// Categorical selections are expected to come from the option catalog; the
/// free-text fields are carried through for display only and never reach a
/// model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermitSubmission {
    pub permit_number: String,
    pub status: String,
    pub permit_type: String,
    pub permit_type_mapped: String,
    pub permit_class_top: String,
    pub permit_class_group: String,
    pub permit_class_mapped: String,
    pub work_class: String,
    pub work_class_group: String,
    pub work_class_mapped: String,
    pub applied_date: NaiveDate,
    pub issued_date: NaiveDate,
    pub completed_date: NaiveDate,
    pub total_sqft: u32,
    pub housing_units: u32,
    pub location_count: u32,
    pub community_name: String,
    pub contractor_name: String,
    #[serde(default)]
    pub applicant_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub description: String,
}

/// Engineered features recomputed for every request, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedFeatures {
    /// Days between applied and issued; may be zero or negative here.
    pub approval_duration: i64,
    /// Days between issued and completed; may be zero or negative here.
    pub completion_duration: i64,
    /// Zero when housing units is zero, by contract (never NaN).
    pub sqft_per_unit: f64,
    /// NaN when approval duration is zero. Informational only; never fed to a
    /// model, and its value must not influence any cost output.
    pub build_duration_ratio: f64,
    pub applied_year: i32,
    /// Community folded to "Other" when outside the top subset.
    pub community_top: String,
    /// Contractor folded to "Other" when outside the top subset.
    pub contractor_top: String,
}

/// The fixed 16-field schema every pipeline was trained against. Field names
/// must serialize exactly as the training columns were spelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    #[serde(rename = "PermitType")]
    pub permit_type: String,
    #[serde(rename = "PermitClass_Top")]
    pub permit_class_top: String,
    #[serde(rename = "PermitClassGroup")]
    pub permit_class_group: String,
    #[serde(rename = "WorkClass")]
    pub work_class: String,
    #[serde(rename = "WorkClassGroup")]
    pub work_class_group: String,
    #[serde(rename = "WorkClassMapped")]
    pub work_class_mapped: String,
    #[serde(rename = "StatusCurrent_Top")]
    pub status_current_top: String,
    #[serde(rename = "TotalSqFt")]
    pub total_sqft: u32,
    #[serde(rename = "HousingUnits")]
    pub housing_units: u32,
    #[serde(rename = "SqFtPerUnit")]
    pub sqft_per_unit: f64,
    #[serde(rename = "AppliedYear")]
    pub applied_year: i32,
    #[serde(rename = "ApprovalDuration")]
    pub approval_duration: i64,
    #[serde(rename = "CompletionDuration")]
    pub completion_duration: i64,
    #[serde(rename = "LocationCount")]
    pub location_count: u32,
    #[serde(rename = "CommunityName_Top")]
    pub community_name_top: String,
    #[serde(rename = "ContractorName_Top")]
    pub contractor_name_top: String,
}

impl FeatureRecord {
    /// Look up a categorical column by its training name.
    pub fn categorical(&self, column: &str) -> Option<&str> {
        match column {
            "PermitType" => Some(&self.permit_type),
            "PermitClass_Top" => Some(&self.permit_class_top),
            "PermitClassGroup" => Some(&self.permit_class_group),
            "WorkClass" => Some(&self.work_class),
            "WorkClassGroup" => Some(&self.work_class_group),
            "WorkClassMapped" => Some(&self.work_class_mapped),
            "StatusCurrent_Top" => Some(&self.status_current_top),
            "CommunityName_Top" => Some(&self.community_name_top),
            "ContractorName_Top" => Some(&self.contractor_name_top),
            _ => None,
        }
    }

    /// Look up a numeric column by its training name.
    pub fn numeric(&self, column: &str) -> Option<f64> {
        match column {
            "TotalSqFt" => Some(f64::from(self.total_sqft)),
            "HousingUnits" => Some(f64::from(self.housing_units)),
            "SqFtPerUnit" => Some(self.sqft_per_unit),
            "AppliedYear" => Some(f64::from(self.applied_year)),
            "ApprovalDuration" => Some(self.approval_duration as f64),
            "CompletionDuration" => Some(self.completion_duration as f64),
            "LocationCount" => Some(f64::from(self.location_count)),
            _ => None,
        }
    }
}

/// Coarse cost category selected by thresholding the first-pass estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostBracket {
    Small,
    Medium,
    Large,
}

impl CostBracket {
    pub const fn label(self) -> &'static str {
        match self {
            CostBracket::Small => "small",
            CostBracket::Medium => "medium",
            CostBracket::Large => "large",
        }
    }
}

/// Single-model prediction: the raw log-scale output and its monetary value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostEstimate {
    pub log_cost: f64,
    pub cost: f64,
}

/// Stratified prediction with the selected bracket and full diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StratifiedEstimate {
    pub bracket: CostBracket,
    pub cost: f64,
    pub diagnostics: StratifiedDiagnostics,
}

/// Both passes of the stratified dispatch, for the diagnostic panel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StratifiedDiagnostics {
    pub first_pass_log_cost: f64,
    pub first_pass_cost: f64,
    pub final_log_cost: f64,
    pub final_cost: f64,
}
