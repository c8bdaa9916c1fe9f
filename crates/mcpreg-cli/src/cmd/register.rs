use crate::assistant;
use crate::cmd::{finish, load_config, report_cancelled};
use crate::prompt::Console;
use anyhow::Context;
use mcpreg_core::{Orchestrator, Reconciliation};
use std::path::Path;

pub struct RegisterArgs {
    pub repo_url: Option<String>,
    pub no_assistant: bool,
    pub yes: bool,
}

/// Conversational registration: one repository URL in, the assistant (or
/// the fallback derivation) fills in the rest.
pub fn run(root: &Path, args: RegisterArgs, json: bool) -> anyhow::Result<()> {
    let config = load_config(root)?;
    let mut console = Console::stdio();

    let identifier = match args.repo_url {
        Some(url) if !url.trim().is_empty() => url.trim().to_string(),
        _ => console.ask_required("Repository URL")?,
    };

    let backend = if args.no_assistant {
        None
    } else {
        assistant::connect(&config.assistant, root)
    };
    let mut orchestrator = Orchestrator::new(backend);
    if !orchestrator.has_assistant() {
        tracing::info!("no assistant attached, deriving metadata from the repository URL");
    }

    let record = match orchestrator
        .collect(&identifier, &mut console)
        .context("failed to collect metadata")?
    {
        Reconciliation::Record(record) => record,
        Reconciliation::Cancelled => return report_cancelled(json),
    };

    finish(root, &config, &record, &mut console, args.yes, json)
}
