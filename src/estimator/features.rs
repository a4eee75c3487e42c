use super::catalog::{fields, OptionCatalog};
use super::domain::{DerivedFeatures, FeatureRecord, PermitSubmission};
use chrono::Datelike;

/// Compute the engineered features from a raw submission.
///
/// Pure and total: every branch yields a defined value. The two division
/// guards are deliberately asymmetric — `sqft_per_unit` clamps to zero when
/// the unit count is zero, while `build_duration_ratio` goes NaN when the
/// approval duration is zero.
pub fn derive_features(submission: &PermitSubmission, catalog: &OptionCatalog) -> DerivedFeatures {
    let approval_duration = (submission.issued_date - submission.applied_date).num_days();
    let completion_duration = (submission.completed_date - submission.issued_date).num_days();

    let sqft_per_unit = if submission.housing_units == 0 {
        0.0
    } else {
        f64::from(submission.total_sqft) / f64::from(submission.housing_units)
    };

    let build_duration_ratio = if approval_duration == 0 {
        f64::NAN
    } else {
        completion_duration as f64 / approval_duration as f64
    };

    let applied_year = submission.applied_date.year();

    let community_top = catalog.fold_top(fields::COMMUNITY_TOP, &submission.community_name);
    let contractor_top = catalog.fold_top(fields::CONTRACTOR_TOP, &submission.contractor_name);

    DerivedFeatures {
        approval_duration,
        completion_duration,
        sqft_per_unit,
        build_duration_ratio,
        applied_year,
        community_top,
        contractor_top,
    }
}

/// Assemble the fixed 16-field record every pipeline expects.
///
/// Note `build_duration_ratio` is absent: it is derived for completeness but
/// was never a training column.
pub fn feature_record(submission: &PermitSubmission, derived: &DerivedFeatures) -> FeatureRecord {
    FeatureRecord {
        permit_type: submission.permit_type.clone(),
        permit_class_top: submission.permit_class_top.clone(),
        permit_class_group: submission.permit_class_group.clone(),
        work_class: submission.work_class.clone(),
        work_class_group: submission.work_class_group.clone(),
        work_class_mapped: submission.work_class_mapped.clone(),
        status_current_top: submission.status.clone(),
        total_sqft: submission.total_sqft,
        housing_units: submission.housing_units,
        sqft_per_unit: derived.sqft_per_unit,
        applied_year: derived.applied_year,
        approval_duration: derived.approval_duration,
        completion_duration: derived.completion_duration,
        location_count: submission.location_count,
        community_name_top: derived.community_top.clone(),
        contractor_name_top: derived.contractor_top.clone(),
    }
}
