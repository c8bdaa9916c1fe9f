//! The three registration artifacts: `metadata.json`, `openapi.json` and
//! `README.md`. Rendering is pure; [`write_artifacts`] is the only function
//! touching the filesystem.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{RegistryError, Result};
use crate::io::atomic_write;
use crate::metadata::MetadataRecord;
use crate::paths;
use crate::validate::check_name;

pub const OPENAPI_VERSION: &str = "3.0.0";

// ---------------------------------------------------------------------------
// metadata.json
// ---------------------------------------------------------------------------

pub fn render_metadata_json(record: &MetadataRecord) -> Result<String> {
    let mut out = serde_json::to_string_pretty(record)?;
    out.push('\n');
    Ok(out)
}

// ---------------------------------------------------------------------------
// openapi.json
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct OpenApiDoc<'a> {
    openapi: &'static str,
    info: Info<'a>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    servers: Vec<Server>,
    paths: BTreeMap<&'static str, PathItem>,
}

#[derive(Serialize)]
struct Info<'a> {
    title: &'a str,
    description: &'a str,
    version: &'a str,
    contact: Contact<'a>,
}

#[derive(Serialize)]
struct Contact<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
}

#[derive(Serialize)]
struct Server {
    url: String,
    description: String,
}

#[derive(Serialize, Default)]
struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    post: Option<Operation>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Operation {
    summary: &'static str,
    description: &'static str,
    operation_id: &'static str,
    responses: BTreeMap<&'static str, Response>,
}

#[derive(Serialize)]
struct Response {
    description: &'static str,
}

fn responses(codes: &[(&'static str, &'static str)]) -> BTreeMap<&'static str, Response> {
    codes
        .iter()
        .map(|&(code, description)| (code, Response { description }))
        .collect()
}

/// Minimal OpenAPI document: a `/health` probe and the `/mcp` protocol
/// endpoint. `servers` appears only when an endpoint URL is known.
pub fn render_openapi(record: &MetadataRecord) -> Result<String> {
    let servers = match record.endpoint_url.trim() {
        "" => Vec::new(),
        url => vec![Server {
            url: url.to_string(),
            description: format!("{} server", record.name),
        }],
    };

    let mut paths = BTreeMap::new();
    paths.insert(
        "/health",
        PathItem {
            get: Some(Operation {
                summary: "Health check endpoint",
                description: "Returns the health status of the MCP server",
                operation_id: "getHealth",
                responses: responses(&[("200", "Healthy"), ("503", "Unhealthy")]),
            }),
            ..Default::default()
        },
    );
    paths.insert(
        "/mcp",
        PathItem {
            post: Some(Operation {
                summary: "MCP protocol endpoint",
                description: "Main endpoint for MCP protocol communication",
                operation_id: "mcpEndpoint",
                responses: responses(&[
                    ("200", "Success"),
                    ("400", "Bad Request"),
                    ("401", "Unauthorized"),
                ]),
            }),
            ..Default::default()
        },
    );

    let doc = OpenApiDoc {
        openapi: OPENAPI_VERSION,
        info: Info {
            title: &record.name,
            description: &record.description,
            version: &record.version,
            contact: Contact {
                name: &record.owner,
                email: Some(record.contact_email.trim()).filter(|e| !e.is_empty()),
            },
        },
        servers,
        paths,
    };
    let mut out = serde_json::to_string_pretty(&doc)?;
    out.push('\n');
    Ok(out)
}

// ---------------------------------------------------------------------------
// README.md
// ---------------------------------------------------------------------------

fn auth_details(auth_method: &str) -> &'static str {
    match auth_method.to_lowercase().as_str() {
        "none" => "No authentication required. This is suitable for internal or development environments only.",
        "api-key" => "### API Key Authentication

To authenticate, include your API key in the request headers:

```
Authorization: Bearer YOUR_API_KEY
```

Contact the server owner to obtain an API key.",
        "oauth2" => "### OAuth 2.0 Authentication

This server uses OAuth 2.0. Obtain an access token before calling it:

1. Register your application with the OAuth provider
2. Obtain authorization from the user
3. Exchange the authorization code for an access token
4. Send the access token with each request

Contact the server owner for OAuth configuration details.",
        "entra-id" => "### Microsoft Entra ID Authentication

This server uses Microsoft Entra ID (formerly Azure AD):

1. Register your application in the Azure Portal
2. Request the required scopes
3. Obtain an access token from Entra ID
4. Send the token in the Authorization header

Required scopes and application registration details are available from the server owner.",
        _ => "Authentication details will be provided by the server owner.",
    }
}

// Pipes would split a markdown table cell.
fn cell(value: &str) -> String {
    value.replace('|', "\\|")
}

fn present(value: &str) -> Option<&str> {
    Some(value.trim()).filter(|v| !v.is_empty())
}

pub fn render_readme(record: &MetadataRecord) -> String {
    let mut sections = Vec::new();

    let mut title = format!("# {}", record.name);
    if let Some(summary) = present(&record.summary) {
        title.push_str(&format!("\n\n_{summary}_"));
    }
    sections.push(title);

    sections.push(format!("## Overview\n\n{}", record.description));

    let mut table = String::from("## Metadata\n\n| Field | Value |\n|-------|-------|");
    for (label, value) in [
        ("Version", &record.version),
        ("Owner", &record.owner),
        ("Company", &record.company),
        ("Status", &record.status),
        ("Lifecycle", &record.lifecycle),
        ("Repository", &record.repository_url),
    ] {
        if let Some(value) = present(value) {
            table.push_str(&format!("\n| **{label}** | {} |", cell(value)));
        }
    }
    sections.push(table);

    sections.push(format!(
        "## Authentication\n\nThis MCP server uses **{}** for authentication.\n\n{}",
        record.auth_method,
        auth_details(&record.auth_method)
    ));

    let email = present(&record.contact_email);
    let mut contact = format!("## Contact\n\n- **Owner**: {}", record.owner);
    if let Some(email) = email {
        contact.push_str(&format!("\n- **Email**: {email}"));
    }
    sections.push(contact);

    if let Some(url) = present(&record.endpoint_url) {
        sections.push(format!("## Endpoint\n\n- **URL**: {url}"));
    }
    if let Some(url) = present(&record.documentation_url) {
        sections.push(format!("## Documentation\n\nFor more details, see: {url}"));
    }
    if !record.tags.is_empty() {
        let tags: Vec<String> = record.tags.iter().map(|t| format!("`{t}`")).collect();
        sections.push(format!("## Tags\n\n{}", tags.join(", ")));
    }

    sections.push(
        "## Usage

To use this MCP server:

1. Ensure you have the appropriate authentication credentials
2. Connect to the endpoint using an MCP-compatible client
3. Follow the API specification defined in `openapi.json`"
            .to_string(),
    );

    let reach = match email {
        Some(email) => format!("{} at {email}.", record.owner),
        None => format!("{}.", record.owner),
    };
    sections.push(format!(
        "## Support\n\nFor support or questions, please contact {reach}"
    ));

    let mut out = sections.join("\n\n");
    out.push('\n');
    out
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Paths of the files written for one registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    pub dir: PathBuf,
    pub metadata: PathBuf,
    pub openapi: PathBuf,
    pub readme: PathBuf,
}

impl ArtifactSet {
    pub fn files(&self) -> [&Path; 3] {
        [&self.openapi, &self.metadata, &self.readme]
    }
}

/// Render and atomically write all three artifacts under
/// `<root>/<output_dir>/<name>/`.
pub fn write_artifacts(root: &Path, output_dir: &str, record: &MetadataRecord) -> Result<ArtifactSet> {
    // The name becomes a directory; refuse anything that is not a slug.
    if record.name.trim().is_empty() {
        return Err(RegistryError::Validation(vec!["Name is required".to_string()]));
    }
    if let Some(msg) = check_name(&record.name) {
        return Err(RegistryError::Validation(vec![msg]));
    }

    let dir = paths::api_dir(root, output_dir, &record.name);
    let set = ArtifactSet {
        metadata: dir.join(paths::METADATA_FILE),
        openapi: dir.join(paths::OPENAPI_FILE),
        readme: dir.join(paths::README_FILE),
        dir,
    };

    atomic_write(&set.openapi, render_openapi(record)?.as_bytes())?;
    atomic_write(&set.metadata, render_metadata_json(record)?.as_bytes())?;
    atomic_write(&set.readme, render_readme(record).as_bytes())?;

    tracing::info!(dir = %set.dir.display(), "wrote registration artifacts");
    Ok(set)
}
