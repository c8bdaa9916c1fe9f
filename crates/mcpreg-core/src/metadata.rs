use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const STATUSES: &[&str] = &["active", "deprecated", "planned"];

pub const LIFECYCLES: &[&str] = &[
    "design",
    "development",
    "testing",
    "preview",
    "production",
    "deprecated",
    "retired",
];

pub const AUTH_METHODS: &[&str] = &["none", "api-key", "oauth2", "entra-id"];

pub const DEFAULT_VERSION: &str = "1.0.0";
pub const DEFAULT_STATUS: &str = "active";
pub const DEFAULT_LIFECYCLE: &str = "development";
/// Auth method preselected by the field-by-field front-end.
pub const DEFAULT_AUTH_METHOD: &str = "api-key";
/// Auth method of a record derived from the repository identifier alone.
pub const FALLBACK_AUTH_METHOD: &str = "none";

// ---------------------------------------------------------------------------
// MetadataRecord
// ---------------------------------------------------------------------------

/// The canonical registration record written to `metadata.json`.
///
/// Field declaration order is the serialized key order. Optional string
/// fields use the empty string for "absent".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetadataRecord {
    pub name: String,
    pub description: String,
    pub summary: String,
    pub version: String,
    pub company: String,
    pub status: String,
    pub lifecycle: String,
    pub owner: String,
    pub auth_method: String,
    pub contact_email: String,
    pub endpoint_url: String,
    pub documentation_url: String,
    pub tags: Vec<String>,
    pub custom_properties: BTreeMap<String, String>,
    pub repository_url: String,
}

impl Default for MetadataRecord {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            summary: String::new(),
            version: DEFAULT_VERSION.to_string(),
            company: String::new(),
            status: DEFAULT_STATUS.to_string(),
            lifecycle: DEFAULT_LIFECYCLE.to_string(),
            owner: String::new(),
            auth_method: DEFAULT_AUTH_METHOD.to_string(),
            contact_email: String::new(),
            endpoint_url: String::new(),
            documentation_url: String::new(),
            tags: Vec::new(),
            custom_properties: BTreeMap::new(),
            repository_url: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// ReconciliationRecord
// ---------------------------------------------------------------------------

/// Partially-trusted values decoded from assistant output. Every field is
/// optional except `confirmed`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationRecord {
    pub name: Option<String>,
    pub description: Option<String>,
    pub summary: Option<String>,
    pub version: Option<String>,
    pub company: Option<String>,
    pub status: Option<String>,
    pub lifecycle: Option<String>,
    pub owner: Option<String>,
    pub auth_method: Option<String>,
    pub contact_email: Option<String>,
    pub endpoint_url: Option<String>,
    pub documentation_url: Option<String>,
    pub tags: Option<Vec<String>>,
    pub custom_properties: Option<BTreeMap<String, String>>,
    pub repository_url: Option<String>,
    pub confirmed: bool,
}

/// `Some(trimmed)` when `value` has non-whitespace content.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
