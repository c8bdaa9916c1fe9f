use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

use crate::process::AgentProcess;
use crate::types::{Message, QueryOptions};
use crate::Result;

type Sender = mpsc::Sender<Result<Message>>;

/// Messages of a single-turn query, ending with the first
/// [`Message::Result`].
///
/// A background task owns the [`AgentProcess`] and feeds a channel. Dropping
/// the stream closes the channel; the task notices on its next send and
/// kills the process.
pub struct QueryStream {
    rx: mpsc::Receiver<Result<Message>>,
}

impl QueryStream {
    pub(crate) fn new(prompt: String, opts: QueryOptions) -> Self {
        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(async move {
            if let Err(e) = drive(&prompt, &opts, &tx).await {
                let _ = tx.send(Err(e)).await;
            }
        });
        Self { rx }
    }

    #[cfg(test)]
    pub(crate) fn from_channel(rx: mpsc::Receiver<Result<Message>>) -> Self {
        Self { rx }
    }
}

async fn drive(prompt: &str, opts: &QueryOptions, tx: &Sender) -> Result<()> {
    let mut process = AgentProcess::spawn(opts)?;
    let outcome = relay(&mut process, prompt, tx).await;
    process.kill().await;
    outcome
}

async fn relay(process: &mut AgentProcess, prompt: &str, tx: &Sender) -> Result<()> {
    process.send_prompt(prompt).await?;
    process.close_stdin();

    if forward(process, tx).await? {
        return Ok(());
    }
    // EOF before a result: a failed exit is the interesting part.
    match process.wait_exit_error().await {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Copy messages into `tx`. `Ok(true)` once the terminal result went out;
/// `Ok(false)` at EOF or when nobody is listening anymore.
async fn forward(process: &mut AgentProcess, tx: &Sender) -> Result<bool> {
    while let Some(msg) = process.next_message().await? {
        let terminal = matches!(msg, Message::Result(_));
        if tx.send(Ok(msg)).await.is_err() {
            return Ok(false);
        }
        if terminal {
            return Ok(true);
        }
    }
    Ok(false)
}

impl Stream for QueryStream {
    type Item = Result<Message>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResultSubtype;
    use futures::StreamExt;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tokio::process::Command;

    const INIT: &str = r#"{"type":"system","subtype":"init","session_id":"s1","model":"m","cwd":"/tmp"}"#;
    const TEXT: &str = r#"{"type":"assistant","session_id":"s1","message":{"role":"assistant","content":[{"type":"text","text":"weather-lookup"}]}}"#;
    const RESULT: &str = r#"{"type":"result","subtype":"success","session_id":"s1","result":"weather-lookup","is_error":false,"num_turns":1}"#;

    /// Replay `lines` through `cat` standing in for the assistant.
    async fn replay(lines: &[&str]) -> Vec<Result<Message>> {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        let (tx, rx) = mpsc::channel(32);
        let mut cmd = Command::new("cat");
        cmd.arg(file.path());
        let mut process = AgentProcess::spawn_command(cmd).unwrap();
        tokio::spawn(async move {
            if let Err(e) = forward(&mut process, &tx).await {
                let _ = tx.send(Err(e)).await;
            }
            process.kill().await;
        });
        let messages = QueryStream::from_channel(rx).collect().await;
        drop(file);
        messages
    }

    #[tokio::test]
    async fn yields_every_message_up_to_the_result() {
        let messages = replay(&[INIT, TEXT, RESULT]).await;
        assert_eq!(messages.len(), 3);
        assert!(messages.iter().all(|m| m.is_ok()));
    }

    #[tokio::test]
    async fn nothing_after_the_result_is_forwarded() {
        let messages = replay(&[INIT, RESULT, TEXT]).await;
        assert_eq!(messages.len(), 2);
        let last = messages.last().unwrap().as_ref().unwrap();
        assert!(matches!(last, Message::Result(r) if r.subtype == ResultSubtype::Success));
    }

    #[tokio::test]
    async fn blank_and_unknown_lines_are_skipped() {
        let unknown = r#"{"type":"rate_limit_event","session_id":"s1"}"#;
        let messages = replay(&[INIT, "", "  ", unknown, RESULT]).await;
        assert_eq!(messages.len(), 2);
    }

    #[tokio::test]
    async fn garbage_ends_the_stream_with_a_parse_error() {
        let messages = replay(&["this is not json", RESULT]).await;
        assert_eq!(messages.len(), 1);
        assert!(matches!(messages[0], Err(crate::AgentError::Parse { .. })));
    }
}
