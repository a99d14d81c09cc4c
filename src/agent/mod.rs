// src/agent/mod.rs

//! Analysis agent abstraction.
//!
//! The monitor and the envision analyzer talk to an [`AgentBackend`] instead
//! of spawning processes themselves. Production code uses
//! [`ClaudeCliBackend`], which drives the agent CLI as a child process;
//! tests plug in a scripted backend that replays canned messages.
//!
//! Whatever the backend, a response is a stream of [`AgentMessage`]s:
//! text chunks, tool-use notices and at most one final summary.

pub mod claude;
pub mod response;
pub mod stream;

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use tokio::sync::mpsc;

use crate::errors::Result;

pub use claude::ClaudeCliBackend;
pub use response::{collect_response, ResponseAccumulator};
pub use stream::parse_stream_line;

/// One item of an agent response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentMessage {
    /// A fragment of assistant text.
    Chunk(String),
    /// The agent invoked a tool with this name.
    ToolUse(String),
    /// The closing summary. When non-empty it supersedes the chunks.
    Final(String),
}

/// A single prompt plus the permissions it runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub prompt: String,
    pub allowed_tools: Vec<String>,
    pub max_turns: Option<u32>,
    /// Working directory for the agent; inherits ours when `None`.
    pub cwd: Option<PathBuf>,
}

impl QueryRequest {
    pub fn new(prompt: impl Into<String>, allowed_tools: &[String]) -> Self {
        Self {
            prompt: prompt.into(),
            allowed_tools: allowed_tools.to_vec(),
            max_turns: None,
            cwd: None,
        }
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = Some(max_turns);
        self
    }
}

/// Receiving side of a response. An `Err` item ends the response.
pub type AgentStream = mpsc::Receiver<Result<AgentMessage>>;

/// Trait abstracting how prompts reach the agent.
///
/// Dropping the returned stream abandons the query; implementations must
/// stop any work (and child processes) they started for it.
pub trait AgentBackend: Send + Sync {
    fn query(
        &self,
        request: QueryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<AgentStream>> + Send + '_>>;
}
