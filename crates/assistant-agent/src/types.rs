use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Name of the tool the assistant calls when it needs an answer from the
/// operator. Any other tool call is ignored by the driver.
pub const ASK_USER_TOOL: &str = "AskUserQuestion";

/// Default bound on how long the driver waits for the next backend message.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

// ─── Messages ─────────────────────────────────────────────────────────────

/// One line of `--output-format stream-json` output, discriminated by
/// `"type"`. Only the fields the driver acts on are modelled; serde ignores
/// the rest.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    System(SystemMessage),
    Assistant(AssistantMessage),
    /// Echo of something fed back to the model (tool results).
    User(UserMessage),
    Result(ResultMessage),
}

#[derive(Debug, Clone, Deserialize)]
pub struct SystemMessage {
    pub session_id: String,
    #[serde(flatten)]
    pub payload: SystemPayload,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "subtype", rename_all = "snake_case")]
pub enum SystemPayload {
    /// First message of a session.
    Init {
        #[serde(default)]
        model: String,
        #[serde(default)]
        cwd: String,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserMessage {
    pub session_id: String,
}

// ─── Assistant turns ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct AssistantMessage {
    pub session_id: String,
    pub message: AssistantContent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssistantContent {
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    /// Thinking, images and anything newer.
    #[serde(other)]
    Other,
}

impl AssistantMessage {
    /// Text blocks of this turn joined by newlines; `None` for a turn with
    /// no text (a bare tool call, say).
    pub fn text(&self) -> Option<String> {
        let mut texts = self.message.content.iter().filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        });
        let first = texts.next()?;
        Some(texts.fold(first.to_string(), |mut acc, t| {
            acc.push('\n');
            acc.push_str(t);
            acc
        }))
    }

    /// `(id, name, input)` of every tool call in this turn, in order.
    pub fn tool_uses(&self) -> impl Iterator<Item = (&str, &str, &serde_json::Value)> {
        self.message.content.iter().filter_map(|block| match block {
            ContentBlock::ToolUse { id, name, input } => Some((id.as_str(), name.as_str(), input)),
            _ => None,
        })
    }
}

// ─── Result ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSubtype {
    Success,
    ErrorMaxTurns,
    ErrorDuringExecution,
    #[serde(other)]
    Other,
}

/// Terminal message of a session: the backend is idle once it arrives.
#[derive(Debug, Clone, Deserialize)]
pub struct ResultMessage {
    pub subtype: ResultSubtype,
    pub session_id: String,
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    is_error: bool,
    #[serde(default)]
    pub num_turns: u32,
}

impl ResultMessage {
    pub fn is_error(&self) -> bool {
        self.is_error || self.subtype != ResultSubtype::Success
    }

    /// Final text of a successful session.
    pub fn result_text(&self) -> Option<&str> {
        if self.is_error() {
            None
        } else {
            self.result.as_deref()
        }
    }
}

// ─── QueryOptions ─────────────────────────────────────────────────────────

/// How to launch the assistant subprocess.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub model: Option<String>,
    pub max_turns: Option<u32>,
    /// Tools the assistant may call without asking for permission
    pub allowed_tools: Vec<String>,
    pub permission_mode: PermissionMode,
    pub system_prompt: Option<String>,
    /// Working directory (default: inherited)
    pub cwd: Option<PathBuf>,
    /// Assistant binary (default: `claude` on PATH)
    pub executable: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PermissionMode {
    /// Whatever the assistant CLI does by default.
    #[default]
    Default,
    /// Deny every tool call that is not pre-approved instead of prompting.
    DontAsk,
}

impl PermissionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PermissionMode::Default => "default",
            PermissionMode::DontAsk => "dontAsk",
        }
    }
}

// ─── User input requests ──────────────────────────────────────────────────

/// A question the assistant wants the operator to answer, decoded from an
/// [`ASK_USER_TOOL`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInputRequest {
    pub tool_use_id: String,
    pub question: String,
    /// Suggested answers; empty means free text.
    pub choices: Vec<String>,
}

impl UserInputRequest {
    /// Decode the tool input. Accepts both the flat
    /// `{"question": "...", "choices": [...]}` shape and the batched
    /// `{"questions": [{"question": "...", "options": [{"label": "..."}]}]}`
    /// shape; only the first batched question is used.
    pub fn from_tool_input(tool_use_id: &str, input: &serde_json::Value) -> Option<Self> {
        let entry = match input.get("questions").and_then(|q| q.as_array()) {
            Some(questions) => questions.first()?,
            None => input,
        };
        let question = entry.get("question")?.as_str()?.trim().to_string();
        if question.is_empty() {
            return None;
        }
        let choices = entry
            .get("choices")
            .or_else(|| entry.get("options"))
            .and_then(|c| c.as_array())
            .map(|items| items.iter().filter_map(choice_label).collect())
            .unwrap_or_default();
        Some(Self {
            tool_use_id: tool_use_id.to_string(),
            question,
            choices,
        })
    }
}

fn choice_label(item: &serde_json::Value) -> Option<String> {
    match item {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Object(obj) => obj
            .get("label")
            .and_then(|l| l.as_str())
            .map(str::to_string),
        _ => None,
    }
}
