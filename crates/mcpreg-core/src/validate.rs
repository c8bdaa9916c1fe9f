//! Fixed rule set applied to a [`MetadataRecord`] before anything is written.
//!
//! Checks run in a stable order (required fields, enums, formats) so the
//! resulting messages can be asserted on directly.

use regex::Regex;
use std::sync::OnceLock;

use crate::metadata::{MetadataRecord, AUTH_METHODS, LIFECYCLES, STATUSES};

static NAME_RE: OnceLock<Regex> = OnceLock::new();
static VERSION_RE: OnceLock<Regex> = OnceLock::new();

fn name_re() -> &'static Regex {
    NAME_RE.get_or_init(|| Regex::new(r"^[a-z0-9-]+$").unwrap())
}

fn version_re() -> &'static Regex {
    VERSION_RE.get_or_init(|| Regex::new(r"^\d+\.\d+\.\d+(-[A-Za-z0-9.-]+)?$").unwrap())
}

/// Validate `record`, returning every violation in check order. An empty
/// list means the record is publishable.
pub fn validate(record: &MetadataRecord) -> Vec<String> {
    let mut errors = Vec::new();

    for (label, value) in [
        ("Name", &record.name),
        ("Description", &record.description),
        ("Company", &record.company),
        ("Owner", &record.owner),
    ] {
        if is_blank(value) {
            errors.push(format!("{label} is required"));
        }
    }

    for (label, value, allowed) in [
        ("Status", &record.status, STATUSES),
        ("Lifecycle", &record.lifecycle, LIFECYCLES),
        ("AuthMethod", &record.auth_method, AUTH_METHODS),
    ] {
        if let Some(msg) = check_enum(label, value, allowed) {
            errors.push(msg);
        }
    }

    if !is_blank(&record.name) {
        errors.extend(check_name(&record.name));
    }
    if !is_blank(&record.version) {
        errors.extend(check_version(&record.version));
    }
    if !is_blank(&record.contact_email) {
        errors.extend(check_email(&record.contact_email));
    }
    for (label, value) in [
        ("EndpointUrl", &record.endpoint_url),
        ("DocumentationUrl", &record.documentation_url),
    ] {
        if !is_blank(value) {
            errors.extend(check_url(label, value));
        }
    }

    errors
}

/// Lowercase names of blank required or enum fields.
pub fn missing_required_fields(record: &MetadataRecord) -> Vec<&'static str> {
    [
        ("name", &record.name),
        ("description", &record.description),
        ("company", &record.company),
        ("owner", &record.owner),
        ("status", &record.status),
        ("lifecycle", &record.lifecycle),
        ("authMethod", &record.auth_method),
    ]
    .into_iter()
    .filter(|(_, value)| is_blank(value))
    .map(|(field, _)| field)
    .collect()
}

// ---------------------------------------------------------------------------
// Single-field checks
// ---------------------------------------------------------------------------

pub fn check_name(name: &str) -> Option<String> {
    (!name_re().is_match(name))
        .then(|| "Name must contain only lowercase letters, numbers, and hyphens".to_string())
}

pub fn check_version(version: &str) -> Option<String> {
    (!version_re().is_match(version))
        .then(|| "Version must follow semantic versioning (e.g., 1.0.0)".to_string())
}

/// A single `local@domain` address with no whitespace anywhere.
pub fn check_email(email: &str) -> Option<String> {
    let valid = !email.chars().any(char::is_whitespace)
        && matches!(
            email.split('@').collect::<Vec<_>>().as_slice(),
            [local, domain] if !local.is_empty() && is_email_domain(domain)
        );
    (!valid).then(|| "ContactEmail must be a valid email address".to_string())
}

fn is_email_domain(domain: &str) -> bool {
    !domain.is_empty() && domain.split('.').all(|label| !label.is_empty())
}

/// Absolute URL with scheme `http` or `https` and a host.
pub fn check_url(label: &str, value: &str) -> Option<String> {
    let valid = url::Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
        .unwrap_or(false);
    (!valid).then(|| format!("{label} must be a valid URL"))
}

/// Case-insensitive membership check. Surrounding whitespace is not
/// forgiven.
pub fn check_enum(label: &str, value: &str, allowed: &[&str]) -> Option<String> {
    let lowered = value.to_lowercase();
    (!allowed.contains(&lowered.as_str()))
        .then(|| format!("{label} must be one of: {}", allowed.join(", ")))
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
