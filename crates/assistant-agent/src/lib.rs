//! `assistant-agent`: async driver for an assistant CLI speaking the
//! line-delimited `stream-json` protocol.
//!
//! ```text
//! QueryOptions
//!     │
//!     ▼
//! AgentProcess    ← spawns `<exe> --print --output-format stream-json
//!     │              --input-format stream-json …`, prompt on stdin,
//!     │              JSONL on stdout, stderr captured
//!     ├──► QueryStream / runner::run   single turn, stdin closed after prompt
//!     └──► conversation::converse      multi turn, answers AskUserQuestion
//! ```
//!
//! Every wait is bounded; an expired wait is [`AgentError::Timeout`].

pub mod conversation;
pub mod error;
pub mod runner;
pub mod stream;
pub mod types;

pub(crate) mod process;


pub use conversation::{converse, ConversationOutcome};
pub use error::AgentError;
pub use runner::{run, RunConfig, RunResult};
pub use stream::QueryStream;
pub use types::{
    AssistantMessage, ContentBlock, Message, PermissionMode, QueryOptions, ResultMessage,
    ResultSubtype, UserInputRequest, ASK_USER_TOOL, DEFAULT_TIMEOUT,
};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, AgentError>;

/// Drive a single-turn query. The returned stream ends after the first
/// [`Message::Result`] or on process exit.
pub fn query(prompt: impl Into<String>, opts: QueryOptions) -> QueryStream {
    QueryStream::new(prompt.into(), opts)
}

/// Whether `executable` (default `claude`) resolves on `PATH` or as a path.
pub fn is_available(executable: Option<&str>) -> bool {
    let exe = executable.unwrap_or(process::DEFAULT_EXECUTABLE);
    which::which(exe).is_ok()
}
