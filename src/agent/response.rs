// src/agent/response.rs

use crate::agent::{AgentMessage, AgentStream};
use crate::errors::Result;

/// Folds a message stream into the text a user should see.
///
/// Chunks are appended in order. A non-empty `Final` replaces whatever was
/// accumulated, since the summary repeats the assistant text.
#[derive(Debug, Default, Clone)]
pub struct ResponseAccumulator {
    text: String,
    tool_uses: Vec<String>,
    files_touched: usize,
}

impl ResponseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: &AgentMessage) {
        match message {
            AgentMessage::Chunk(text) => self.text.push_str(text),
            AgentMessage::ToolUse(name) => {
                if name == "Read" || name == "Glob" {
                    self.files_touched += 1;
                }
                self.tool_uses.push(name.clone());
            }
            AgentMessage::Final(summary) => {
                if !summary.is_empty() {
                    self.text = summary.clone();
                }
            }
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    pub fn tool_uses(&self) -> &[String] {
        &self.tool_uses
    }

    /// Number of `Read`/`Glob` tool invocations seen so far.
    pub fn files_touched(&self) -> usize {
        self.files_touched
    }
}

/// Drain `stream` into an accumulator, calling `on_message` for every item
/// as it arrives. The first error item is returned as the error.
pub async fn collect_response<F>(
    mut stream: AgentStream,
    mut on_message: F,
) -> Result<ResponseAccumulator>
where
    F: FnMut(&AgentMessage),
{
    let mut acc = ResponseAccumulator::new();
    while let Some(item) = stream.recv().await {
        let message = item?;
        on_message(&message);
        acc.push(&message);
    }
    Ok(acc)
}
