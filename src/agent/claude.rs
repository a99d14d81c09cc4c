// src/agent/claude.rs

//! Production backend: drives the `claude` CLI as a child process.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::agent::stream::parse_stream_line;
use crate::agent::{AgentBackend, AgentMessage, AgentStream, QueryRequest};
use crate::config::AgentSection;
use crate::errors::{Result, WatchfixError};

const STREAM_BUFFER: usize = 64;

/// Spawns `<command> -p <prompt> --output-format stream-json ...` per query.
#[derive(Debug, Clone)]
pub struct ClaudeCliBackend {
    command: String,
    extra_args: Vec<String>,
}

impl ClaudeCliBackend {
    pub fn new(command: impl Into<String>, extra_args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            extra_args,
        }
    }

    pub fn from_config(agent: &AgentSection) -> Self {
        Self::new(agent.command.clone(), agent.extra_args.clone())
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Arguments passed to the agent CLI for `request`.
    pub fn build_args(&self, request: &QueryRequest) -> Vec<String> {
        let mut args = vec![
            "-p".to_string(),
            request.prompt.clone(),
            "--output-format".to_string(),
            "stream-json".to_string(),
            "--verbose".to_string(),
        ];

        if !request.allowed_tools.is_empty() {
            args.push("--allowedTools".to_string());
            args.push(request.allowed_tools.join(","));
        }

        if let Some(max_turns) = request.max_turns {
            args.push("--max-turns".to_string());
            args.push(max_turns.to_string());
        }

        args.extend(self.extra_args.iter().cloned());
        args
    }

    fn spawn(&self, request: &QueryRequest) -> Result<Child> {
        let mut cmd = Command::new(&self.command);
        cmd.args(self.build_args(request))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(cwd) = &request.cwd {
            cmd.current_dir(cwd);
        }

        cmd.spawn().map_err(|err| {
            WatchfixError::AgentError(format!(
                "failed to start agent command '{}': {err}",
                self.command
            ))
        })
    }
}

impl Default for ClaudeCliBackend {
    fn default() -> Self {
        Self::from_config(&AgentSection::default())
    }
}

impl AgentBackend for ClaudeCliBackend {
    fn query(
        &self,
        request: QueryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<AgentStream>> + Send + '_>> {
        Box::pin(async move {
            info!(
                command = %self.command,
                tools = %request.allowed_tools.join(","),
                "starting agent query"
            );

            let mut child = self.spawn(&request)?;

            let stdout = child.stdout.take().ok_or_else(|| {
                WatchfixError::AgentError("agent stdout was not captured".to_string())
            })?;

            // Always consume stderr so buffers don't fill; log at debug.
            if let Some(stderr) = child.stderr.take() {
                tokio::spawn(async move {
                    let mut lines = BufReader::new(stderr).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        debug!("agent stderr: {}", line);
                    }
                });
            }

            let (tx, rx) = mpsc::channel(STREAM_BUFFER);
            tokio::spawn(pump_stdout(child, stdout, tx));
            Ok(rx)
        })
    }
}

/// Forward parsed stdout lines to `tx` until EOF, then report the exit
/// status. Owns the child: if the receiver goes away the child is dropped,
/// and with it killed.
async fn pump_stdout(
    mut child: Child,
    stdout: ChildStdout,
    tx: mpsc::Sender<Result<AgentMessage>>,
) {
    let mut lines = BufReader::new(stdout).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = tx.closed() => {
                debug!("agent stream dropped by consumer; killing agent process");
                return;
            }
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                let _ = tx.send(Err(WatchfixError::IoError(err))).await;
                return;
            }
        };

        match parse_stream_line(&line) {
            Ok(messages) => {
                for message in messages {
                    if tx.send(Ok(message)).await.is_err() {
                        return;
                    }
                }
            }
            Err(err) => {
                let _ = tx.send(Err(err)).await;
                return;
            }
        }
    }

    match child.wait().await {
        Ok(status) if status.success() => {
            debug!("agent process exited successfully");
        }
        Ok(status) => {
            warn!(exit_code = ?status.code(), "agent process exited with failure");
            let _ = tx
                .send(Err(WatchfixError::AgentError(format!(
                    "agent process exited with {status}"
                ))))
                .await;
        }
        Err(err) => {
            let _ = tx.send(Err(WatchfixError::IoError(err))).await;
        }
    }
}
