pub mod config;
pub mod interactive;
pub mod register;
pub mod validate;

use crate::output::{print_json, print_list};
use crate::prompt::Console;
use anyhow::Context;
use mcpreg_core::config::{Config, WarnLevel};
use mcpreg_core::publish::{ProcessRunner, Publisher, ReviewOutcome};
use mcpreg_core::render::write_artifacts;
use mcpreg_core::validate::validate as validate_record;
use mcpreg_core::{MetadataRecord, RegistryError};
use serde::Serialize;
use std::io::{BufRead, Write};
use std::path::Path;

/// Load the checkout config, logging non-fatal findings.
pub(crate) fn load_config(root: &Path) -> anyhow::Result<Config> {
    let config = Config::load(root).context("failed to load config")?;
    for w in config.validate() {
        if w.level == WarnLevel::Warning {
            tracing::warn!("{}", w.message);
        }
    }
    Ok(config)
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Serialize)]
struct Report {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    files: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<String>,
    pushed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    review_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    review_error: Option<String>,
}

pub(crate) fn report_cancelled(json: bool) -> anyhow::Result<()> {
    tracing::info!("registration cancelled by operator");
    if json {
        print_json(&Report {
            status: "cancelled",
            ..Default::default()
        })
    } else {
        println!("Registration cancelled. Nothing was written.");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Shared tail: validate → render → commit → push → review request
// ---------------------------------------------------------------------------

pub(crate) fn finish<R: BufRead, W: Write>(
    root: &Path,
    config: &Config,
    record: &MetadataRecord,
    console: &mut Console<R, W>,
    yes: bool,
    json: bool,
) -> anyhow::Result<()> {
    let errors = validate_record(record);
    if !errors.is_empty() {
        return Err(RegistryError::Validation(errors).into());
    }

    let set = write_artifacts(root, &config.output_dir, record)
        .with_context(|| format!("failed to write artifacts for '{}'", record.name))?;

    let mut report = Report {
        status: "written",
        name: Some(record.name.clone()),
        files: set
            .files()
            .into_iter()
            .map(|p| p.strip_prefix(root).unwrap_or(p).display().to_string())
            .collect(),
        ..Default::default()
    };

    if !json {
        println!("Wrote registration for '{}':", record.name);
        print_list(&report.files);
    }

    if !(yes || console.ask_yes_no("Commit these changes?")?) {
        return emit(&report, json);
    }

    let mut publisher = Publisher::new(ProcessRunner, root, config.git.clone());
    let commit = publisher
        .commit_registration(record)
        .context("failed to commit registration")?;
    report.status = "committed";
    report.branch = Some(commit.branch.clone());
    if !json {
        println!("Committed to branch {}.", commit.branch);
    }

    if !(yes || console.ask_yes_no("Push branch and create Pull Request?")?) {
        return emit(&report, json);
    }

    let outcome = publisher
        .submit(record, &commit.branch, true)
        .with_context(|| format!("failed to push {}", commit.branch))?;
    report.status = "submitted";
    report.pushed = true;
    match outcome.review {
        ReviewOutcome::Opened(url) => {
            if !json {
                println!("Pull request: {url}");
            }
            report.review_url = Some(url);
        }
        ReviewOutcome::Failed(msg) => {
            if !json {
                println!(
                    "Pushed {} to {}, but the pull request could not be created:",
                    outcome.branch,
                    publisher.remote()
                );
                println!("  {msg}");
                println!("Open it manually from branch {}.", outcome.branch);
            }
            report.review_error = Some(msg);
        }
        ReviewOutcome::Skipped => {}
    }

    emit(&report, json)
}

fn emit(report: &Report, json: bool) -> anyhow::Result<()> {
    if json {
        print_json(report)?;
    }
    Ok(())
}
