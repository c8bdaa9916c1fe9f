use std::time::Duration;

use futures::StreamExt;

use crate::stream::QueryStream;
use crate::{query, AgentError, Message, QueryOptions, Result};

/// A one-shot question: prompt in, final text out, no tool round trips.
#[derive(Debug)]
pub struct RunConfig {
    /// Replaces `opts.system_prompt` when set.
    pub system_prompt: Option<String>,
    pub prompt: String,
    pub opts: QueryOptions,
    /// Longest wait for any single message. `None` waits forever.
    pub timeout: Option<Duration>,
}

#[derive(Debug)]
pub struct RunResult {
    pub session_id: String,
    /// Empty when the run ended in an error.
    pub result_text: String,
    pub num_turns: u32,
    pub is_error: bool,
}

/// Run `config` to its terminal result message.
///
/// ```rust,ignore
/// let result = assistant_agent::run(RunConfig {
///     system_prompt: None,
///     prompt: "Suggest a slug for a weather lookup service".into(),
///     opts: Default::default(),
///     timeout: Some(assistant_agent::DEFAULT_TIMEOUT),
/// }).await?;
/// ```
pub async fn run(config: RunConfig) -> Result<RunResult> {
    let RunConfig {
        system_prompt,
        prompt,
        mut opts,
        timeout,
    } = config;
    if system_prompt.is_some() {
        opts.system_prompt = system_prompt;
    }
    collect(query(prompt, opts), timeout).await
}

/// Drain `stream` until its result message. Dropping the stream on any
/// early return kills the subprocess.
pub(crate) async fn collect(mut stream: QueryStream, limit: Option<Duration>) -> Result<RunResult> {
    loop {
        let next = match limit {
            Some(limit) => tokio::time::timeout(limit, stream.next())
                .await
                .map_err(|_| AgentError::Timeout(limit))?,
            None => stream.next().await,
        };
        let Some(msg) = next else {
            return Err(AgentError::Process(
                "stream ended without a result message".into(),
            ));
        };
        if let Message::Result(r) = msg? {
            return Ok(RunResult {
                result_text: r.result_text().unwrap_or_default().to_string(),
                is_error: r.is_error(),
                session_id: r.session_id,
                num_turns: r.num_turns,
            });
        }
    }
}
