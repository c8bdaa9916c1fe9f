use crate::output::{print_json, print_list};
use anyhow::Context;
use mcpreg_core::validate::missing_required_fields;
use mcpreg_core::{validate, MetadataRecord};
use std::path::Path;

pub fn run(path: &Path, json: bool) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let record: MetadataRecord = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a metadata document", path.display()))?;

    let errors = validate(&record);

    if json {
        let value = serde_json::json!({
            "path": path.display().to_string(),
            "valid": errors.is_empty(),
            "errors": errors,
            "missing": missing_required_fields(&record),
        });
        print_json(&value)?;
    } else if errors.is_empty() {
        println!("{} is valid.", path.display());
    } else {
        println!("{} has {} problem(s):", path.display(), errors.len());
        print_list(&errors);
    }

    if !errors.is_empty() {
        anyhow::bail!("metadata validation failed");
    }

    Ok(())
}
