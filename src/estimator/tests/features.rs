use super::common::*;
use crate::estimator::features::{derive_features, feature_record};

#[test]
fn derives_durations_ratio_and_year() {
    // applied 2020-01-01, issued 2020-02-01, completed 2020-04-01
    let derived = derive_features(&submission(), &catalog());

    assert_eq!(derived.approval_duration, 31);
    assert_eq!(derived.completion_duration, 60);
    assert_eq!(derived.applied_year, 2020);
    assert!((derived.build_duration_ratio - 60.0 / 31.0).abs() < 1e-12);
}

#[test]
fn sqft_per_unit_divides_by_housing_units() {
    let derived = derive_features(&submission(), &catalog());
    assert_eq!(derived.sqft_per_unit, 1732.0);
}

#[test]
fn sqft_per_unit_is_zero_when_units_are_zero() {
    let mut submission = submission();
    submission.housing_units = 0;

    let derived = derive_features(&submission, &catalog());

    assert_eq!(derived.sqft_per_unit, 0.0);
    assert!(!derived.sqft_per_unit.is_nan());
}

#[test]
fn build_duration_ratio_is_nan_when_approval_is_zero() {
    let mut submission = submission();
    submission.issued_date = submission.applied_date;

    let derived = derive_features(&submission, &catalog());

    assert_eq!(derived.approval_duration, 0);
    assert!(derived.build_duration_ratio.is_nan());
}

#[test]
fn community_outside_top_subset_folds_to_other() {
    let mut submission = submission();
    submission.community_name = "SILVERADO".to_string();

    let derived = derive_features(&submission, &catalog());

    assert_eq!(derived.community_top, "Other");
}

#[test]
fn top_community_and_contractor_pass_through() {
    let derived = derive_features(&submission(), &catalog());

    assert_eq!(derived.community_top, "BELTLINE");
    assert_eq!(derived.contractor_top, "Cardel Homes");
}

#[test]
fn contractor_outside_top_subset_folds_to_other() {
    let mut submission = submission();
    submission.contractor_name = "Local Builder".to_string();

    let derived = derive_features(&submission, &catalog());

    assert_eq!(derived.contractor_top, "Other");
}

#[test]
fn feature_record_has_exactly_the_sixteen_training_columns() {
    let submission = submission();
    let derived = derive_features(&submission, &catalog());
    let record = feature_record(&submission, &derived);

    let value = serde_json::to_value(&record).expect("record serializes");
    let object = value.as_object().expect("record is an object");

    let expected = [
        "PermitType",
        "PermitClass_Top",
        "PermitClassGroup",
        "WorkClass",
        "WorkClassGroup",
        "WorkClassMapped",
        "StatusCurrent_Top",
        "TotalSqFt",
        "HousingUnits",
        "SqFtPerUnit",
        "AppliedYear",
        "ApprovalDuration",
        "CompletionDuration",
        "LocationCount",
        "CommunityName_Top",
        "ContractorName_Top",
    ];

    assert_eq!(object.len(), expected.len());
    for column in expected {
        assert!(object.contains_key(column), "missing column {column}");
    }
}

#[test]
fn feature_record_carries_derived_values() {
    let submission = submission();
    let derived = derive_features(&submission, &catalog());
    let record = feature_record(&submission, &derived);

    assert_eq!(record.approval_duration, 31);
    assert_eq!(record.completion_duration, 60);
    assert_eq!(record.sqft_per_unit, 1732.0);
    assert_eq!(record.applied_year, 2020);
    assert_eq!(record.status_current_top, "Completed");
    assert_eq!(record.community_name_top, "BELTLINE");
}
