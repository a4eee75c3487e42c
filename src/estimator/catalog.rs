use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// Literal value used when a community or contractor falls outside its top
/// subset. The pipelines were trained with this exact spelling.
pub const OTHER: &str = "Other";

/// Catalog field keys, named after the training columns they feed.
pub mod fields {
    pub const STATUS: &str = "StatusCurrent_Top";
    pub const PERMIT_TYPE: &str = "PermitType";
    pub const PERMIT_TYPE_MAPPED: &str = "PermitTypeMapped";
    pub const PERMIT_CLASS_TOP: &str = "PermitClass_Top";
    pub const PERMIT_CLASS_GROUP: &str = "PermitClassGroup";
    pub const PERMIT_CLASS_MAPPED: &str = "PermitClassMapped";
    pub const WORK_CLASS: &str = "WorkClass";
    pub const WORK_CLASS_GROUP: &str = "WorkClassGroup";
    pub const WORK_CLASS_MAPPED: &str = "WorkClassMapped";
    pub const COMMUNITY_ALL: &str = "CommunityName_all";
    pub const COMMUNITY_TOP: &str = "CommunityName_Top";
    pub const CONTRACTOR_ALL: &str = "ContractorName_all";
    pub const CONTRACTOR_TOP: &str = "ContractorName_Top";

    pub(super) const REQUIRED: [&str; 13] = [
        STATUS,
        PERMIT_TYPE,
        PERMIT_TYPE_MAPPED,
        PERMIT_CLASS_TOP,
        PERMIT_CLASS_GROUP,
        PERMIT_CLASS_MAPPED,
        WORK_CLASS,
        WORK_CLASS_GROUP,
        WORK_CLASS_MAPPED,
        COMMUNITY_ALL,
        COMMUNITY_TOP,
        CONTRACTOR_ALL,
        CONTRACTOR_TOP,
    ];
}

/// Valid categorical values per form field, loaded once per process and shared
/// read-only afterwards.
#[derive(Debug, Clone)]
pub struct OptionCatalog {
    options: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct OptionRow {
    field: String,
    value: String,
}

impl OptionCatalog {
    /// Load the catalog from `field,value` CSV rows. Every field in
    /// [`fields::REQUIRED`] must appear at least once.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut options: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for row in csv_reader.deserialize::<OptionRow>() {
            let row = row?;
            options.entry(row.field).or_default().push(row.value);
        }

        for values in options.values_mut() {
            values.sort();
            values.dedup();
        }

        for name in fields::REQUIRED {
            if !options.contains_key(name) {
                return Err(CatalogError::MissingField {
                    name: name.to_string(),
                });
            }
        }

        Ok(Self { options })
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// The built-in demo catalog used when no artifact directory is set.
    pub fn demo() -> Self {
        Self::from_reader(include_str!("../../assets/options.csv").as_bytes())
            .expect("embedded demo catalog is well formed")
    }

    /// Valid values for a field, empty when the field is unknown.
    pub fn values(&self, field: &str) -> &[String] {
        self.options.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All catalog fields and their values, for the options endpoint.
    pub fn all(&self) -> &BTreeMap<String, Vec<String>> {
        &self.options
    }

    /// Fold a selection against a top subset: values outside the subset map to
    /// the literal [`OTHER`].
    pub fn fold_top(&self, top_field: &str, value: &str) -> String {
        if self.values(top_field).iter().any(|v| v == value) {
            value.to_string()
        } else {
            OTHER.to_string()
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read option catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed option catalog row: {0}")]
    Csv(#[from] csv::Error),
    #[error("option catalog is missing field '{name}'")]
    MissingField { name: String },
}
