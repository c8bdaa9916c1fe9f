use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("metadata is invalid:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),

    #[error("{tool} {} failed: {stderr}", .args.join(" "))]
    Tool {
        tool: String,
        args: Vec<String>,
        stderr: String,
    },

    #[error("failed to run {tool}: {source}")]
    ToolSpawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("assistant error: {0}")]
    Assistant(String),

    #[error("could not decode assistant reply: {0}")]
    Decode(String),

    #[error("prompt failed: {0}")]
    Prompt(String),

    #[error("not a git repository (or any parent): {}", .0.display())]
    NotARepository(PathBuf),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, RegistryError>;
