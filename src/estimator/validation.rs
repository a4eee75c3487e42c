use super::domain::{DerivedFeatures, PermitSubmission};
use serde::Serialize;
use std::fmt;

/// Date ordering problems surfaced as warnings. Either one suppresses the
/// prediction entirely, independently of the missing-field list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrderWarning {
    IssuedNotAfterApplied,
    CompletedNotAfterIssued,
}

impl DateOrderWarning {
    pub const fn message(self) -> &'static str {
        match self {
            DateOrderWarning::IssuedNotAfterApplied => "Issued Date must be after Applied Date",
            DateOrderWarning::CompletedNotAfterIssued => {
                "Completed Date must be after Issued Date"
            }
        }
    }
}

impl fmt::Display for DateOrderWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Aggregated result of the required-input checks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub missing_fields: Vec<&'static str>,
    pub date_warnings: Vec<DateOrderWarning>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.missing_fields.is_empty() && self.date_warnings.is_empty()
    }
}

/// Check required fields and date ordering on a submission.
///
/// The field list mirrors the form's required inputs; the mapped permit and
/// work class variants and the location count are deliberately not required.
pub fn validate_submission(
    submission: &PermitSubmission,
    derived: &DerivedFeatures,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    let mut require = |present: bool, label: &'static str| {
        if !present {
            report.missing_fields.push(label);
        }
    };

    require(!submission.permit_number.trim().is_empty(), "Permit Number");
    require(!submission.status.is_empty(), "Permit Status");
    require(!submission.permit_type.is_empty(), "Permit Type");
    require(!submission.permit_class_top.is_empty(), "Permit Class Top");
    require(
        !submission.permit_class_group.is_empty(),
        "Permit Class Group",
    );
    require(!submission.work_class.is_empty(), "Work Class");
    require(submission.total_sqft != 0, "Total Square Feet");
    require(submission.housing_units != 0, "Housing Units");
    require(!submission.community_name.is_empty(), "Community Name");
    require(!submission.contractor_name.is_empty(), "Contractor Name");

    if derived.approval_duration <= 0 {
        report
            .date_warnings
            .push(DateOrderWarning::IssuedNotAfterApplied);
    }
    if derived.completion_duration <= 0 {
        report
            .date_warnings
            .push(DateOrderWarning::CompletedNotAfterIssued);
    }

    report
}
