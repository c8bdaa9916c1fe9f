use crate::error::{RegistryError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path};
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// AssistantConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Assistant CLI to spawn (default: `claude` on PATH)
    #[serde(default)]
    pub executable: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub max_turns: Option<u32>,
    /// Upper bound on each wait for the assistant, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            executable: None,
            model: None,
            max_turns: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl AssistantConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// GitConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitConfig {
    #[serde(default = "default_branch_prefix")]
    pub branch_prefix: String,
    /// Branch review requests target
    #[serde(default = "default_base_branch")]
    pub base_branch: String,
    #[serde(default = "default_remote")]
    pub remote: String,
}

fn default_branch_prefix() -> String {
    "mcp-registration/".to_string()
}

fn default_base_branch() -> String {
    "main".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            branch_prefix: default_branch_prefix(),
            base_branch: default_base_branch(),
            remote: default_remote(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Optional `.mcpreg.yaml` at the repository root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub git: GitConfig,
    /// Directory, relative to the root, that receives `<name>/` artifact dirs
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

fn default_output_dir() -> String {
    paths::DEFAULT_OUTPUT_DIR.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            assistant: AssistantConfig::default(),
            git: GitConfig::default(),
            output_dir: default_output_dir(),
        }
    }
}

impl Config {
    /// Load `<root>/.mcpreg.yaml`, or defaults when the file is absent.
    /// Error-level validation findings reject the file.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        // An empty file deserializes to unit, not a mapping.
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(&data)?;
        let errors: Vec<String> = cfg
            .validate()
            .into_iter()
            .filter(|w| w.level == WarnLevel::Error)
            .map(|w| w.message)
            .collect();
        if !errors.is_empty() {
            return Err(RegistryError::InvalidConfig(errors.join("; ")));
        }
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.assistant.timeout_secs == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "assistant.timeout_secs is 0; every assistant wait will time out"
                    .to_string(),
            });
        }

        if self.git.branch_prefix.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "git.branch_prefix is empty; registrations will commit to a branch named after the server".to_string(),
            });
        }

        if self.git.remote.trim().is_empty() || self.git.base_branch.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "git.remote and git.base_branch must not be empty".to_string(),
            });
        }

        let out = Path::new(&self.output_dir);
        if self.output_dir.trim().is_empty()
            || out.is_absolute()
            || out.components().any(|c| c == Component::ParentDir)
        {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "output_dir '{}' must be a relative path inside the repository",
                    self.output_dir
                ),
            });
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::load(dir.path()).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.assistant.timeout(), Duration::from_secs(300));
        assert_eq!(cfg.git.branch_prefix, "mcp-registration/");
        assert_eq!(cfg.output_dir, "apis");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(".mcpreg.yaml"),
            "assistant:\n  model: gpt-4.1\n  timeout_secs: 30\ngit:\n  base_branch: develop\n",
        )
        .unwrap();
        let cfg = Config::load(dir.path()).unwrap();
        assert!(cfg.assistant.enabled);
        assert_eq!(cfg.assistant.model.as_deref(), Some("gpt-4.1"));
        assert_eq!(cfg.assistant.timeout_secs, 30);
        assert_eq!(cfg.git.base_branch, "develop");
        assert_eq!(cfg.git.remote, "origin");
        assert_eq!(cfg.output_dir, "apis");
    }

    #[test]
    fn empty_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".mcpreg.yaml"), "\n").unwrap();
        assert_eq!(Config::load(dir.path()).unwrap(), Config::default());
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let mut cfg = Config::default();
        cfg.assistant.enabled = false;
        cfg.output_dir = "registry/apis".into();
        cfg.save(dir.path()).unwrap();
        assert_eq!(Config::load(dir.path()).unwrap(), cfg);
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".mcpreg.yaml"), "assistant: [unclosed").unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(RegistryError::Yaml(_))
        ));
    }

    #[test]
    fn escaping_output_dir_is_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".mcpreg.yaml"), "output_dir: ../outside\n").unwrap();
        let err = Config::load(dir.path()).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidConfig(_)));
        assert!(err.to_string().contains("../outside"));
    }

    #[test]
    fn default_config_has_no_warnings() {
        assert!(Config::default().validate().is_empty());
    }

    #[test]
    fn zero_timeout_and_empty_prefix_warn() {
        let mut cfg = Config::default();
        cfg.assistant.timeout_secs = 0;
        cfg.git.branch_prefix.clear();
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().all(|w| w.level == WarnLevel::Warning));
        assert!(warnings[0].message.contains("timeout_secs"));
        assert!(warnings[1].message.contains("branch_prefix"));
    }
}
