use crate::metadata::{
    non_blank, MetadataRecord, ReconciliationRecord, DEFAULT_LIFECYCLE, DEFAULT_STATUS,
    DEFAULT_VERSION, FALLBACK_AUTH_METHOD,
};
use crate::naming::sanitize_slug;

/// Owner and company used when the identifier has a single segment.
pub const UNKNOWN_OWNER: &str = "unknown";

/// Outcome of merging assistant output with the deterministic fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    Record(MetadataRecord),
    /// The operator declined the proposed values.
    Cancelled,
}

/// Merge `decoded` with the fallback derived from `identifier`.
///
/// - no decoded record: the fallback record as-is
/// - `confirmed == false`: [`Reconciliation::Cancelled`]
/// - `confirmed == true`: decoded non-blank values over fallback defaults,
///   with `name`, `company` and `owner` slug-sanitized
///
/// `repositoryUrl` is always `identifier`.
pub fn reconcile(decoded: Option<ReconciliationRecord>, identifier: &str) -> Reconciliation {
    let Some(decoded) = decoded else {
        tracing::info!(identifier, "deriving metadata from repository identifier");
        return Reconciliation::Record(fallback_record(identifier));
    };
    if !decoded.confirmed {
        tracing::info!("operator declined the proposed metadata");
        return Reconciliation::Cancelled;
    }

    let fallback = fallback_record(identifier);
    let pick = |value: &Option<String>, default: &str| -> String {
        non_blank(value.as_deref()).unwrap_or(default).to_string()
    };
    let pick_enum = |value: &Option<String>, default: &str| -> String {
        non_blank(value.as_deref())
            .map(str::to_lowercase)
            .unwrap_or_else(|| default.to_string())
    };

    let tags = decoded
        .tags
        .unwrap_or_default()
        .into_iter()
        .filter_map(|t| non_blank(Some(t.as_str())).map(str::to_string))
        .collect();

    Reconciliation::Record(MetadataRecord {
        name: sanitize_slug(&pick(&decoded.name, &fallback.name)),
        description: pick(&decoded.description, &fallback.description),
        summary: pick(&decoded.summary, ""),
        version: pick(&decoded.version, DEFAULT_VERSION),
        company: sanitize_slug(&pick(&decoded.company, &fallback.company)),
        status: pick_enum(&decoded.status, DEFAULT_STATUS),
        lifecycle: pick_enum(&decoded.lifecycle, DEFAULT_LIFECYCLE),
        owner: sanitize_slug(&pick(&decoded.owner, &fallback.owner)),
        auth_method: pick_enum(&decoded.auth_method, FALLBACK_AUTH_METHOD),
        contact_email: pick(&decoded.contact_email, ""),
        endpoint_url: pick(&decoded.endpoint_url, ""),
        documentation_url: pick(&decoded.documentation_url, ""),
        tags,
        custom_properties: decoded.custom_properties.unwrap_or_default(),
        repository_url: identifier.to_string(),
    })
}

/// Metadata derived from the repository identifier alone.
///
/// The last path segment (minus `.git`) becomes the name slug, the one
/// before it becomes company and owner verbatim.
pub fn fallback_record(identifier: &str) -> MetadataRecord {
    let segments: Vec<&str> = identifier.split('/').filter(|s| !s.is_empty()).collect();
    let last = segments.last().copied().unwrap_or_default();
    let basis = last.strip_suffix(".git").unwrap_or(last);
    let owner = match segments.len() {
        n if n >= 2 => segments[n - 2],
        _ => UNKNOWN_OWNER,
    };

    MetadataRecord {
        name: sanitize_slug(basis),
        description: format!("MCP server hosted at {identifier}"),
        version: DEFAULT_VERSION.to_string(),
        company: owner.to_string(),
        status: DEFAULT_STATUS.to_string(),
        lifecycle: DEFAULT_LIFECYCLE.to_string(),
        owner: owner.to_string(),
        auth_method: FALLBACK_AUTH_METHOD.to_string(),
        repository_url: identifier.to_string(),
        ..Default::default()
    }
}
