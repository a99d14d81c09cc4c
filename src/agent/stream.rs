// src/agent/stream.rs

//! Parser for the agent CLI's line-delimited JSON output
//! (`--output-format stream-json`).

use serde::Deserialize;
use tracing::{debug, trace};

use crate::agent::AgentMessage;
use crate::errors::{Result, WatchfixError};

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamLine {
    Assistant {
        message: AssistantMessage,
    },
    Result {
        #[serde(default)]
        result: Option<String>,
        #[serde(default)]
        is_error: bool,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: MessageContent,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Blocks(Vec::new())
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        name: String,
    },
    #[serde(other)]
    Other,
}

/// Turn one output line into zero or more messages.
///
/// Lines that are not JSON, or JSON of a type we do not consume (system
/// init, user/tool results), yield nothing. A `result` line flagged
/// `is_error` becomes [`WatchfixError::AgentError`].
pub fn parse_stream_line(line: &str) -> Result<Vec<AgentMessage>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Vec::new());
    }

    let parsed: StreamLine = match serde_json::from_str(line) {
        Ok(parsed) => parsed,
        Err(err) => {
            debug!(error = %err, "skipping non-json agent output line");
            return Ok(Vec::new());
        }
    };

    match parsed {
        StreamLine::Assistant { message } => Ok(match message.content {
            MessageContent::Text(text) => vec![AgentMessage::Chunk(text)],
            MessageContent::Blocks(blocks) => blocks
                .into_iter()
                .filter_map(|block| match block {
                    ContentBlock::Text { text } => Some(AgentMessage::Chunk(text)),
                    ContentBlock::ToolUse { name } => Some(AgentMessage::ToolUse(name)),
                    ContentBlock::Other => None,
                })
                .collect(),
        }),
        StreamLine::Result { result, is_error } => {
            if is_error {
                let detail = result
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| "agent reported an error".to_string());
                return Err(WatchfixError::AgentError(detail));
            }
            Ok(result.map(AgentMessage::Final).into_iter().collect())
        }
        StreamLine::Other => {
            trace!("ignoring agent output line of unhandled type");
            Ok(Vec::new())
        }
    }
}
