use std::time::Duration;

use crate::process::AgentProcess;
use crate::types::{Message, QueryOptions, UserInputRequest, ASK_USER_TOOL};
use crate::{AgentError, Result};

/// What a finished conversation produced.
#[derive(Debug, Clone)]
pub struct ConversationOutcome {
    pub session_id: String,
    /// Last assistant text of the session, or the result text when the
    /// assistant never produced a text block.
    pub final_text: String,
    pub num_turns: u32,
    pub is_error: bool,
}

/// Run a multi-turn conversation.
///
/// The prompt is sent once; every `AskUserQuestion` tool call the assistant
/// makes is decoded into a [`UserInputRequest`], handed to `on_input`, and the
/// answer written back as a `tool_result`. The session is idle once a
/// `result` message arrives. Each wait for the next message is bounded by
/// `limit`.
pub async fn converse<F>(
    prompt: &str,
    opts: &QueryOptions,
    limit: Duration,
    on_input: F,
) -> Result<ConversationOutcome>
where
    F: FnMut(&UserInputRequest) -> Result<String>,
{
    let process = AgentProcess::spawn(opts)?;
    drive(process, prompt, limit, on_input).await
}

async fn drive<F>(
    mut process: AgentProcess,
    prompt: &str,
    limit: Duration,
    mut on_input: F,
) -> Result<ConversationOutcome>
where
    F: FnMut(&UserInputRequest) -> Result<String>,
{
    process.send_prompt(prompt).await?;
    let mut last_text: Option<String> = None;

    loop {
        let next = match tokio::time::timeout(limit, process.next_message()).await {
            Ok(next) => next,
            Err(_) => {
                process.kill().await;
                return Err(AgentError::Timeout(limit));
            }
        };

        match next? {
            None => {
                return Err(process.wait_exit_error().await.unwrap_or_else(|| {
                    AgentError::Process("assistant exited without a result message".into())
                }));
            }
            Some(Message::Assistant(turn)) => {
                if let Some(text) = turn.text() {
                    last_text = Some(text);
                }
                for (id, name, input) in turn.tool_uses() {
                    if name != ASK_USER_TOOL {
                        tracing::debug!(tool = name, "ignoring tool call");
                        continue;
                    }
                    let answer = match UserInputRequest::from_tool_input(id, input) {
                        Some(request) => on_input(&request)?,
                        None => {
                            tracing::warn!(tool_use_id = id, "malformed user-input request");
                            String::new()
                        }
                    };
                    process.send_tool_result(id, &answer).await?;
                }
            }
            Some(Message::Result(result)) => {
                process.close_stdin();
                let final_text = last_text
                    .or_else(|| result.result_text().map(str::to_string))
                    .unwrap_or_default();
                tracing::debug!(
                    session_id = %result.session_id,
                    turns = result.num_turns,
                    "conversation finished"
                );
                return Ok(ConversationOutcome {
                    is_error: result.is_error(),
                    session_id: result.session_id,
                    final_text,
                    num_turns: result.num_turns,
                });
            }
            Some(_) => {}
        }
    }
}
