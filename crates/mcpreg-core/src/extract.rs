//! Pull the authoritative JSON object out of free-form assistant text and
//! decode it leniently.
//!
//! Assistants think out loud, wrap answers in code fences and sometimes emit
//! a draft object before the final one. The last complete top-level object
//! wins; anything that fails to decode sends the caller down the fallback
//! path instead of aborting.

use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::error::{RegistryError, Result};
use crate::metadata::ReconciliationRecord;

static FENCE_RE: OnceLock<Regex> = OnceLock::new();

fn fence_re() -> &'static Regex {
    FENCE_RE.get_or_init(|| Regex::new(r"```[A-Za-z0-9_+-]*").unwrap())
}

/// Return the last balanced top-level `{...}` in `raw`, with code-fence
/// markers removed first. `None` when there is no brace or the last object
/// is never closed.
pub fn extract_object(raw: &str) -> Option<String> {
    let cleaned = fence_re().replace_all(raw, "");

    // Braces are ASCII, so byte offsets are always char boundaries.
    let mut depth = 0usize;
    let mut start = None;
    let mut end = None;
    for (i, b) in cleaned.bytes().enumerate() {
        match b {
            b'{' => {
                if depth == 0 {
                    start = Some(i);
                    end = None;
                }
                depth += 1;
            }
            b'}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    end = Some(i);
                }
            }
            _ => {}
        }
    }

    match (start, end) {
        (Some(s), Some(e)) => Some(cleaned[s..=e].to_string()),
        _ => None,
    }
}

/// Decode an extracted object into a [`ReconciliationRecord`].
///
/// Keys match case-insensitively and unknown keys are ignored. String fields
/// holding anything other than a string are dropped, as are non-string
/// `tags` entries and `customProperties` values. `confirmed` must be present
/// and boolean.
pub fn decode_reconciliation(candidate: &str) -> Result<ReconciliationRecord> {
    let obj = parse_object(candidate)?;
    let mut record = ReconciliationRecord::default();
    let mut confirmed = None;

    for (key, value) in &obj {
        match key.to_ascii_lowercase().as_str() {
            "name" => record.name = string_field(value),
            "description" => record.description = string_field(value),
            "summary" => record.summary = string_field(value),
            "version" => record.version = string_field(value),
            "company" => record.company = string_field(value),
            "status" => record.status = string_field(value),
            "lifecycle" => record.lifecycle = string_field(value),
            "owner" => record.owner = string_field(value),
            "authmethod" => record.auth_method = string_field(value),
            "contactemail" => record.contact_email = string_field(value),
            "endpointurl" => record.endpoint_url = string_field(value),
            "documentationurl" => record.documentation_url = string_field(value),
            "repositoryurl" => record.repository_url = string_field(value),
            "tags" => {
                record.tags = value.as_array().map(|items| {
                    items
                        .iter()
                        .filter_map(|t| t.as_str().map(str::to_string))
                        .collect()
                })
            }
            "customproperties" => {
                record.custom_properties = value.as_object().map(|props| {
                    props
                        .iter()
                        .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                        .collect::<BTreeMap<_, _>>()
                })
            }
            "confirmed" => {
                confirmed = Some(value.as_bool().ok_or_else(|| {
                    RegistryError::Decode(format!("`confirmed` must be a boolean, got {value}"))
                })?)
            }
            _ => {}
        }
    }

    record.confirmed =
        confirmed.ok_or_else(|| RegistryError::Decode("missing `confirmed` field".into()))?;
    Ok(record)
}

/// Extract and decode in one step. Failures are logged and reported as
/// `None` so the caller can fall back.
pub fn parse_reconciliation(raw: &str) -> Option<ReconciliationRecord> {
    let Some(candidate) = extract_object(raw) else {
        tracing::warn!("assistant reply contained no complete JSON object");
        return None;
    };
    match decode_reconciliation(&candidate) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::warn!(error = %e, "assistant reply could not be decoded");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Field review replies
// ---------------------------------------------------------------------------

/// Verdict on a single field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldReview {
    pub is_valid: bool,
    pub message: Option<String>,
    pub suggestion: Option<String>,
}

impl FieldReview {
    pub fn accepted() -> Self {
        Self {
            is_valid: true,
            message: None,
            suggestion: None,
        }
    }
}

/// Decode `{"isValid": bool, "message": "...", "suggestion": "..."}` from an
/// assistant reply. A missing or non-boolean `isValid` is an error.
pub fn parse_field_review(raw: &str) -> Result<FieldReview> {
    let candidate = extract_object(raw)
        .ok_or_else(|| RegistryError::Decode("no JSON object in reply".into()))?;
    let obj = parse_object(&candidate)?;

    let mut review = FieldReview::accepted();
    let mut is_valid = None;
    for (key, value) in &obj {
        match key.to_ascii_lowercase().as_str() {
            "isvalid" => is_valid = value.as_bool(),
            "message" => review.message = string_field(value).filter(|m| !m.trim().is_empty()),
            "suggestion" => {
                review.suggestion = string_field(value).filter(|s| !s.trim().is_empty())
            }
            _ => {}
        }
    }
    review.is_valid =
        is_valid.ok_or_else(|| RegistryError::Decode("missing boolean `isValid`".into()))?;
    Ok(review)
}

fn parse_object(candidate: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(obj)) => Ok(obj),
        Ok(other) => Err(RegistryError::Decode(format!(
            "expected a JSON object, got {other}"
        ))),
        Err(e) => Err(RegistryError::Decode(e.to_string())),
    }
}

fn string_field(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}
