use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use watchfix::agent::{AgentBackend, AgentMessage, AgentStream, QueryRequest};
use watchfix::engine::Approver;
use watchfix::errors::{Result, WatchfixError};

/// One scripted reply to a query.
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    /// Stream these items, then close. `Err(msg)` becomes an agent error.
    Messages(Vec<std::result::Result<AgentMessage, String>>),
    /// `query` itself fails, as when the agent binary cannot be started.
    StartFailure(String),
    /// Never send anything; count the stream as abandoned once dropped.
    Hang,
}

impl ScriptedResponse {
    /// A plain text answer delivered as one chunk plus a matching final.
    pub fn text(text: &str) -> Self {
        ScriptedResponse::Messages(vec![
            Ok(AgentMessage::Chunk(text.to_string())),
            Ok(AgentMessage::Final(text.to_string())),
        ])
    }
}

#[derive(Debug, Default)]
struct BackendState {
    responses: VecDeque<ScriptedResponse>,
    requests: Vec<QueryRequest>,
    abandoned: usize,
}

/// A fake agent that:
/// - records every query it receives
/// - replies with scripted responses in order (an empty stream once the
///   script runs out).
#[derive(Debug, Clone, Default)]
pub struct ScriptedBackend {
    state: Arc<Mutex<BackendState>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, response: ScriptedResponse) -> &Self {
        self.state.lock().unwrap().responses.push_back(response);
        self
    }

    pub fn push_text(&self, text: &str) -> &Self {
        self.push(ScriptedResponse::text(text))
    }

    pub fn requests(&self) -> Vec<QueryRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.prompt).collect()
    }

    /// How many `Hang` streams were dropped by the consumer.
    pub fn abandoned(&self) -> usize {
        self.state.lock().unwrap().abandoned
    }
}

impl AgentBackend for ScriptedBackend {
    fn query(
        &self,
        request: QueryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<AgentStream>> + Send + '_>> {
        let state = Arc::clone(&self.state);

        Box::pin(async move {
            let response = {
                let mut guard = state.lock().unwrap();
                guard.requests.push(request);
                guard.responses.pop_front()
            };

            let (tx, rx) = mpsc::channel(16);
            match response.unwrap_or(ScriptedResponse::Messages(Vec::new())) {
                ScriptedResponse::StartFailure(msg) => return Err(WatchfixError::AgentError(msg)),
                ScriptedResponse::Messages(items) => {
                    tokio::spawn(async move {
                        for item in items {
                            if tx.send(item.map_err(WatchfixError::AgentError)).await.is_err() {
                                break;
                            }
                        }
                    });
                }
                ScriptedResponse::Hang => {
                    tokio::spawn(async move {
                        tx.closed().await;
                        state.lock().unwrap().abandoned += 1;
                    });
                }
            }
            Ok(rx)
        })
    }
}

/// Answers approval questions from a script and records what was asked.
///
/// `None` in the script (or running out of answers) behaves like a closed
/// terminal.
#[derive(Debug, Clone, Default)]
pub struct ScriptedApprover {
    answers: Arc<Mutex<VecDeque<Option<bool>>>>,
    questions: Arc<Mutex<Vec<String>>>,
}

impl ScriptedApprover {
    pub fn new<I>(answers: I) -> Self
    where
        I: IntoIterator<Item = Option<bool>>,
    {
        Self {
            answers: Arc::new(Mutex::new(answers.into_iter().collect())),
            questions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn always(answer: bool) -> Self {
        Self::new(std::iter::repeat_n(Some(answer), 64))
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }
}

impl Approver for ScriptedApprover {
    fn confirm<'a>(
        &'a self,
        question: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<bool>> + Send + 'a>> {
        Box::pin(async move {
            self.questions.lock().unwrap().push(question.to_string());
            match self.answers.lock().unwrap().pop_front().flatten() {
                Some(answer) => Ok(answer),
                None => Err(WatchfixError::ApprovalInputClosed),
            }
        })
    }
}
