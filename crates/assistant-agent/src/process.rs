use std::process::Stdio;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};

use crate::types::{Message, PermissionMode, QueryOptions};
use crate::{AgentError, Result};

/// Executable used when `QueryOptions::executable` is unset.
pub(crate) const DEFAULT_EXECUTABLE: &str = "claude";

// ─── Stderr ───────────────────────────────────────────────────────────────

/// Everything the subprocess has written to stderr, filled by a background
/// reader task.
#[derive(Clone, Default)]
struct StderrTail(Arc<Mutex<String>>);

impl StderrTail {
    fn follow(stderr: ChildStderr) -> Self {
        let tail = Self::default();
        let sink = tail.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                sink.push(&line);
            }
        });
        tail
    }

    fn push(&self, line: &str) {
        if let Ok(mut buf) = self.0.lock() {
            if !buf.is_empty() {
                buf.push('\n');
            }
            buf.push_str(line);
        }
    }

    fn snapshot(&self) -> String {
        self.0.lock().map(|b| b.clone()).unwrap_or_default()
    }
}

// ─── AgentProcess ─────────────────────────────────────────────────────────

/// A running assistant subprocess speaking stream-json in both directions:
/// user messages go in as JSON lines on stdin, assistant output comes back
/// as JSONL on stdout.
pub(crate) struct AgentProcess {
    child: Child,
    stdout: Lines<BufReader<ChildStdout>>,
    stdin: Option<ChildStdin>,
    stderr: StderrTail,
}

impl AgentProcess {
    /// Launch the assistant. Nothing is sent yet; callers follow up with
    /// [`AgentProcess::send_prompt`].
    pub(crate) fn spawn(opts: &QueryOptions) -> Result<Self> {
        let exe = opts.executable.as_deref().unwrap_or(DEFAULT_EXECUTABLE);
        let mut cmd = Command::new(exe);
        cmd.args(command_args(opts));
        if let Some(cwd) = &opts.cwd {
            cmd.current_dir(cwd);
        }
        tracing::debug!(executable = exe, "spawning assistant process");
        Self::launch(cmd)
    }

    /// Run an arbitrary command as a stand-in assistant.
    #[cfg(test)]
    pub(crate) fn spawn_command(cmd: Command) -> Result<Self> {
        Self::launch(cmd)
    }

    fn launch(mut cmd: Command) -> Result<Self> {
        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AgentError::Process("stdout not captured".into()))?;
        let stderr = child
            .stderr
            .take()
            .map(StderrTail::follow)
            .unwrap_or_default();

        Ok(Self {
            stdin: child.stdin.take(),
            stdout: BufReader::new(stdout).lines(),
            stderr,
            child,
        })
    }

    pub(crate) async fn send_prompt(&mut self, prompt: &str) -> Result<()> {
        self.send_user_content(json!([{"type": "text", "text": prompt}]))
            .await
    }

    /// Answer tool call `tool_use_id` with plain text.
    pub(crate) async fn send_tool_result(&mut self, tool_use_id: &str, text: &str) -> Result<()> {
        self.send_user_content(json!([{
            "type": "tool_result",
            "tool_use_id": tool_use_id,
            "content": [{"type": "text", "text": text}]
        }]))
        .await
    }

    async fn send_user_content(&mut self, content: Value) -> Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| AgentError::Process("stdin already closed".into()))?;

        let msg = json!({
            "type": "user",
            "message": {"role": "user", "content": content}
        });
        let mut line = msg.to_string();
        line.push('\n');

        stdin.write_all(line.as_bytes()).await?;
        stdin.flush().await?;
        Ok(())
    }

    /// Signal end of input.
    pub(crate) fn close_stdin(&mut self) {
        self.stdin = None;
    }

    /// Next decodable message, or `None` at EOF. Blank lines and well-formed
    /// JSON with an unmodelled `type` (`rate_limit_event`, say) are skipped;
    /// a modelled type that fails to decode is a parse error.
    pub(crate) async fn next_message(&mut self) -> Result<Option<Message>> {
        while let Some(line) = self.stdout.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Message>(line) {
                Ok(msg) => return Ok(Some(msg)),
                Err(_) if is_unmodelled_type(line) => {
                    tracing::debug!(line, "skipping unknown message type");
                }
                Err(source) => {
                    return Err(AgentError::Parse {
                        line: line.to_owned(),
                        source,
                    })
                }
            }
        }
        Ok(None)
    }

    /// Wait for exit. `Some` describes an unsuccessful exit, with whatever
    /// reached stderr appended.
    pub(crate) async fn wait_exit_error(&mut self) -> Option<AgentError> {
        let status = match self.child.wait().await {
            Ok(s) => s,
            Err(e) => return Some(AgentError::Io(e)),
        };
        if status.success() {
            return None;
        }

        let mut msg = match status.code() {
            Some(code) => format!("assistant process exited with code {code}"),
            None => "assistant process terminated by signal".to_string(),
        };
        let stderr = self.stderr.snapshot();
        if !stderr.is_empty() {
            msg.push_str("\nstderr: ");
            msg.push_str(&stderr);
        }
        Some(AgentError::Process(msg))
    }

    /// Best-effort kill.
    pub(crate) async fn kill(&mut self) {
        let _ = self.child.kill().await;
    }
}

/// `type` tags decoded into [`Message`].
const MODELLED_TYPES: &[&str] = &["system", "assistant", "user", "result"];

fn is_unmodelled_type(line: &str) -> bool {
    serde_json::from_str::<Value>(line)
        .ok()
        .and_then(|v| v.get("type").and_then(Value::as_str).map(str::to_owned))
        .is_some_and(|tag| !MODELLED_TYPES.contains(&tag.as_str()))
}

/// Flags for a headless stream-json session. The prompt itself goes over
/// stdin.
fn command_args(opts: &QueryOptions) -> Vec<String> {
    let mut args: Vec<String> = [
        "--print",
        "--verbose",
        "--output-format",
        "stream-json",
        "--input-format",
        "stream-json",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    if let Some(model) = &opts.model {
        args.extend(["--model".to_string(), model.clone()]);
    }
    if let Some(max_turns) = opts.max_turns {
        args.extend(["--max-turns".to_string(), max_turns.to_string()]);
    }
    if !opts.allowed_tools.is_empty() {
        args.push("--allowed-tools".to_string());
        args.extend(opts.allowed_tools.iter().cloned());
    }
    if opts.permission_mode != PermissionMode::Default {
        args.extend([
            "--permission-mode".to_string(),
            opts.permission_mode.as_str().to_string(),
        ]);
    }
    if let Some(sp) = &opts.system_prompt {
        args.extend(["--system-prompt".to_string(), sp.clone()]);
    }
    args
}
