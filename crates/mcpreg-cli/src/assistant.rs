use assistant_agent::{
    runner::{self, RunConfig},
    AgentError, QueryOptions, ASK_USER_TOOL,
};
use mcpreg_core::config::AssistantConfig;
use mcpreg_core::{Assistant, Operator, RegistryError, Result};
use std::path::Path;
use std::time::Duration;

/// [`Assistant`] backed by an assistant CLI subprocess.
///
/// Owns a current-thread runtime used only while a session is running; the
/// rest of the pipeline stays synchronous.
pub struct AgentAssistant {
    opts: QueryOptions,
    timeout: Duration,
    rt: tokio::runtime::Runtime,
}

/// Build the assistant for this run, or `None` when it is disabled or its
/// executable is not installed.
pub fn connect(config: &AssistantConfig, root: &Path) -> Option<Box<dyn Assistant>> {
    if !config.enabled {
        tracing::info!("assistant disabled in config");
        return None;
    }
    if !assistant_agent::is_available(config.executable.as_deref()) {
        tracing::warn!("assistant executable not found, continuing without it");
        return None;
    }
    match AgentAssistant::new(config, root) {
        Ok(a) => Some(Box::new(a)),
        Err(e) => {
            tracing::warn!(error = %e, "failed to start assistant runtime");
            None
        }
    }
}

impl AgentAssistant {
    fn new(config: &AssistantConfig, root: &Path) -> std::io::Result<Self> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            opts: query_options(config, root),
            timeout: config.timeout(),
            rt,
        })
    }
}

fn query_options(config: &AssistantConfig, root: &Path) -> QueryOptions {
    QueryOptions {
        model: config.model.clone(),
        max_turns: config.max_turns,
        allowed_tools: vec![ASK_USER_TOOL.into()],
        executable: config.executable.clone(),
        cwd: Some(root.to_path_buf()),
        ..Default::default()
    }
}

fn into_registry_error(e: AgentError) -> RegistryError {
    match e {
        // Operator failures travel through the agent as Input; restore them.
        AgentError::Input(msg) => RegistryError::Prompt(msg),
        other => RegistryError::Assistant(other.to_string()),
    }
}

impl Assistant for AgentAssistant {
    fn converse(&mut self, prompt: &str, operator: &mut dyn Operator) -> Result<String> {
        tracing::info!(timeout_secs = self.timeout.as_secs(), "starting assistant conversation");
        let outcome = self
            .rt
            .block_on(assistant_agent::converse(
                prompt,
                &self.opts,
                self.timeout,
                |request| {
                    operator
                        .answer(&request.question, &request.choices)
                        .map_err(|e| AgentError::Input(e.to_string()))
                },
            ))
            .map_err(into_registry_error)?;

        if outcome.is_error {
            return Err(RegistryError::Assistant(format!(
                "session {} ended with an error result after {} turns",
                outcome.session_id, outcome.num_turns
            )));
        }
        Ok(outcome.final_text)
    }

    fn ask(&mut self, prompt: &str) -> Result<String> {
        let config = RunConfig {
            system_prompt: None,
            prompt: prompt.to_string(),
            opts: QueryOptions {
                allowed_tools: Vec::new(),
                ..self.opts.clone()
            },
            timeout: Some(self.timeout),
        };
        let result = self
            .rt
            .block_on(runner::run(config))
            .map_err(into_registry_error)?;
        if result.is_error {
            return Err(RegistryError::Assistant(
                "assistant run ended with an error result".into(),
            ));
        }
        Ok(result.result_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_follow_config() {
        let config = AssistantConfig {
            executable: Some("/opt/assistant".into()),
            model: Some("large".into()),
            max_turns: Some(20),
            ..Default::default()
        };
        let opts = query_options(&config, Path::new("/srv/registry"));
        assert_eq!(opts.executable.as_deref(), Some("/opt/assistant"));
        assert_eq!(opts.model.as_deref(), Some("large"));
        assert_eq!(opts.max_turns, Some(20));
        assert_eq!(opts.allowed_tools, vec![ASK_USER_TOOL.to_string()]);
        assert_eq!(opts.cwd.as_deref(), Some(Path::new("/srv/registry")));
    }

    #[test]
    fn input_errors_become_prompt_errors() {
        assert!(matches!(
            into_registry_error(AgentError::Input("closed".into())),
            RegistryError::Prompt(_)
        ));
        assert!(matches!(
            into_registry_error(AgentError::Timeout(Duration::from_secs(1))),
            RegistryError::Assistant(_)
        ));
    }

    #[test]
    fn disabled_or_missing_assistant_is_not_connected() {
        let disabled = AssistantConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(connect(&disabled, Path::new(".")).is_none());

        let missing = AssistantConfig {
            executable: Some("mcpreg-no-such-assistant-binary".into()),
            ..Default::default()
        };
        assert!(connect(&missing, Path::new(".")).is_none());
    }
}
