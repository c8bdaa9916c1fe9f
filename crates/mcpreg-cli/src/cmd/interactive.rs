use crate::assistant;
use crate::cmd::{finish, load_config, report_cancelled};
use crate::prompt::Console;
use mcpreg_core::metadata::{
    AUTH_METHODS, DEFAULT_AUTH_METHOD, DEFAULT_LIFECYCLE, DEFAULT_STATUS, DEFAULT_VERSION,
    LIFECYCLES, STATUSES,
};
use mcpreg_core::naming::MAX_SUGGESTED_LEN;
use mcpreg_core::validate::{check_email, check_name, check_url, check_version};
use mcpreg_core::{MetadataRecord, Orchestrator};
use std::io::{BufRead, Write};
use std::path::Path;

pub struct InteractiveArgs {
    pub no_assistant: bool,
    pub yes: bool,
}

/// Field-by-field registration.
pub fn run(root: &Path, args: InteractiveArgs, json: bool) -> anyhow::Result<()> {
    let config = load_config(root)?;
    let mut console = Console::stdio();

    let backend = if args.no_assistant {
        None
    } else {
        assistant::connect(&config.assistant, root)
    };
    let mut orchestrator = Orchestrator::new(backend);

    let record = collect_answers(&mut console, &mut orchestrator)?;

    show_summary(&mut console, &record)?;
    if !(args.yes || console.ask_yes_no("Proceed?")?) {
        return report_cancelled(json);
    }

    finish(root, &config, &record, &mut console, args.yes, json)
}

type Check = dyn Fn(&str) -> Option<String>;

const MIN_NAME_LEN: usize = 3;

/// Ask every field in order. Answers are kept as typed; each one has
/// already passed its local check.
fn collect_answers<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    orchestrator: &mut Orchestrator,
) -> mcpreg_core::Result<MetadataRecord> {
    let description = console.ask_required("Description")?;
    let suggested = orchestrator.suggest_name(&description);

    let name = ask_checked(
        console,
        orchestrator,
        "name",
        "Server name",
        &suggested,
        &|v: &str| {
            required("Name", v)
                .or_else(|| check_name_length(v))
                .or_else(|| check_name(v))
        },
    )?;
    let version = ask_checked(
        console,
        orchestrator,
        "version",
        "Version",
        DEFAULT_VERSION,
        &|v: &str| required("Version", v).or_else(|| check_version(v)),
    )?;
    let company = ask_checked(console, orchestrator, "company", "Company", "", &|v: &str| {
        required("Company", v)
    })?;
    let owner = ask_checked(console, orchestrator, "owner", "Owner", "", &|v: &str| {
        required("Owner", v)
    })?;
    let contact_email = ask_optional(console, "Contact email (optional)", &check_email)?;

    let status = console.choose("Status", STATUSES, DEFAULT_STATUS)?;
    let lifecycle = console.choose("Lifecycle", LIFECYCLES, DEFAULT_LIFECYCLE)?;
    let auth_method = console.choose("Authentication method", AUTH_METHODS, DEFAULT_AUTH_METHOD)?;

    let endpoint_url = ask_optional(console, "Endpoint URL (optional)", &|v: &str| {
        check_url("EndpointUrl", v)
    })?;
    let documentation_url = ask_optional(console, "Documentation URL (optional)", &|v: &str| {
        check_url("DocumentationUrl", v)
    })?;
    let tags = split_tags(&console.ask("Tags, comma separated (optional)")?);
    let repository_url = console.ask_required("Repository URL")?;

    Ok(MetadataRecord {
        name,
        description,
        version,
        company,
        owner,
        status,
        lifecycle,
        auth_method,
        contact_email: contact_email.unwrap_or_default(),
        endpoint_url: endpoint_url.unwrap_or_default(),
        documentation_url: documentation_url.unwrap_or_default(),
        tags,
        repository_url,
        ..Default::default()
    })
}

fn required(label: &str, value: &str) -> Option<String> {
    value.is_empty().then(|| format!("{label} is required"))
}

fn check_name_length(name: &str) -> Option<String> {
    let len = name.chars().count();
    (!(MIN_NAME_LEN..=MAX_SUGGESTED_LEN).contains(&len)).then(|| {
        format!("Name must be between {MIN_NAME_LEN} and {MAX_SUGGESTED_LEN} characters")
    })
}

/// Ask until the local check passes, then let the assistant review the
/// value. A review suggestion is only offered if it passes the same check.
fn ask_checked<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    orchestrator: &mut Orchestrator,
    field: &str,
    question: &str,
    default: &str,
    check: &Check,
) -> mcpreg_core::Result<String> {
    let value = loop {
        let value = console.ask_default(question, default)?;
        match check(value.as_str()) {
            Some(msg) => console.say(&msg)?,
            None => break value,
        }
    };

    let review = orchestrator.review_field(field, &value);
    if review.is_valid {
        return Ok(value);
    }
    if let Some(msg) = &review.message {
        console.say(&format!("Note: {msg}"))?;
    }
    let usable = review
        .suggestion
        .filter(|s| *s != value && check(s.as_str()).is_none());
    if let Some(suggestion) = usable {
        if console.ask_yes_no(&format!("Use '{suggestion}' instead?"))? {
            return Ok(suggestion);
        }
    }
    Ok(value)
}

/// Blank is accepted; anything else must pass `check`.
fn ask_optional<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    question: &str,
    check: &Check,
) -> mcpreg_core::Result<Option<String>> {
    loop {
        let value = console.ask(question)?;
        if value.is_empty() {
            return Ok(None);
        }
        match check(value.as_str()) {
            Some(msg) => console.say(&msg)?,
            None => return Ok(Some(value)),
        }
    }
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn show_summary<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    record: &MetadataRecord,
) -> mcpreg_core::Result<()> {
    console.say("")?;
    console.say("Registration summary:")?;
    let rows = [
        ("Name", record.name.as_str()),
        ("Description", record.description.as_str()),
        ("Version", record.version.as_str()),
        ("Company", record.company.as_str()),
        ("Owner", record.owner.as_str()),
        ("Status", record.status.as_str()),
        ("Lifecycle", record.lifecycle.as_str()),
        ("Authentication", record.auth_method.as_str()),
        ("Contact email", record.contact_email.as_str()),
        ("Endpoint URL", record.endpoint_url.as_str()),
        ("Documentation URL", record.documentation_url.as_str()),
        ("Repository URL", record.repository_url.as_str()),
    ];
    for (label, value) in rows {
        if !value.is_empty() {
            console.say(&format!("  {label:<18} {value}"))?;
        }
    }
    if !record.tags.is_empty() {
        console.say(&format!("  {:<18} {}", "Tags", record.tags.join(", ")))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn console(input: &str) -> Console<Cursor<Vec<u8>>, Vec<u8>> {
        Console::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn tags_are_split_and_trimmed() {
        assert_eq!(split_tags(" weather, , forecast ,"), vec!["weather", "forecast"]);
        assert!(split_tags("").is_empty());
    }

    #[test]
    fn answers_are_checked_and_defaulted() {
        let input = [
            "Looks up weather", // description
            "",                 // name: suggested
            "1.0",              // bad version
            "2.1.0",
            "",                 // company required
            "Acme",
            "platform-team",
            "not-an-email",
            "ops@acme.com",
            "",                 // status default
            "5",                // lifecycle: production
            "",                 // auth default
            "ftp://x",          // bad url
            "https://mcp.acme.com",
            "",                 // documentation
            "weather, forecast",
            "https://github.com/acme/weather",
        ]
        .join("\n")
            + "\n";
        let mut c = console(&input);
        let mut orch = Orchestrator::new(None);

        let record = collect_answers(&mut c, &mut orch).unwrap();
        assert_eq!(record.name, "looks-up-weather");
        assert_eq!(record.version, "2.1.0");
        assert_eq!(record.company, "Acme");
        assert_eq!(record.contact_email, "ops@acme.com");
        assert_eq!(record.status, "active");
        assert_eq!(record.lifecycle, "production");
        assert_eq!(record.auth_method, "api-key");
        assert_eq!(record.endpoint_url, "https://mcp.acme.com");
        assert_eq!(record.documentation_url, "");
        assert_eq!(record.tags, vec!["weather", "forecast"]);
        assert_eq!(record.repository_url, "https://github.com/acme/weather");

        let shown = String::from_utf8_lossy(&c.into_output()).into_owned();
        assert!(shown.contains("Version must follow semantic versioning"));
        assert!(shown.contains("Company is required"));
        assert!(shown.contains("ContactEmail must be a valid email address"));
        assert!(shown.contains("EndpointUrl must be a valid URL"));
    }

    fn answers_with(name: &str, company: &str, owner: &str) -> String {
        [
            "Looks up weather",
            name,
            "",
            company,
            owner,
            "",
            "",
            "",
            "",
            "",
            "",
            "",
            "https://github.com/contoso/weather",
        ]
        .join("\n")
            + "\n"
    }

    #[test]
    fn company_and_owner_are_kept_as_typed() {
        let mut c = console(&answers_with("", "Contoso Ltd.", "Jane Doe"));
        let record = collect_answers(&mut c, &mut Orchestrator::new(None)).unwrap();
        assert_eq!(record.company, "Contoso Ltd.");
        assert_eq!(record.owner, "Jane Doe");
        assert!(mcpreg_core::validate(&record).is_empty());
    }

    #[test]
    fn name_length_is_bounded() {
        let long = "a".repeat(51);
        let input = answers_with("x", "Contoso", "jane@contoso.com")
            .replacen("x\n", &format!("x\n{long}\nweather\n"), 1);
        let mut c = console(&input);
        let record = collect_answers(&mut c, &mut Orchestrator::new(None)).unwrap();
        assert_eq!(record.name, "weather");
        assert_eq!(record.owner, "jane@contoso.com");

        let shown = String::from_utf8_lossy(&c.into_output()).into_owned();
        assert_eq!(
            shown.matches("Name must be between 3 and 50 characters").count(),
            2
        );
    }

    #[test]
    fn summary_skips_blank_fields() {
        let record = MetadataRecord {
            name: "weather".into(),
            company: "acme".into(),
            ..Default::default()
        };
        let mut c = console("");
        show_summary(&mut c, &record).unwrap();
        let shown = String::from_utf8_lossy(&c.into_output()).into_owned();
        assert!(shown.contains("Name"));
        assert!(shown.contains("weather"));
        assert!(!shown.contains("Endpoint URL"));
        assert!(!shown.contains("Tags"));
    }
}
