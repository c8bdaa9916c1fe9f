use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = ".mcpreg.yaml";
pub const DEFAULT_OUTPUT_DIR: &str = "apis";

pub const METADATA_FILE: &str = "metadata.json";
pub const OPENAPI_FILE: &str = "openapi.json";
pub const README_FILE: &str = "README.md";

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Directory holding the artifacts of one registration:
/// `<root>/<output_dir>/<name>`.
pub fn api_dir(root: &Path, output_dir: &str, name: &str) -> PathBuf {
    root.join(output_dir).join(name)
}
