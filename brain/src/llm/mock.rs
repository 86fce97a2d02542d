//! Scripted LLM for tests and offline replays.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{LlmClient, MessageRequest, MessageResponse};
use crate::error::LlmError;

/// Answers requests from a queue in order. An exhausted queue fails with
/// [`LlmError::Unavailable`]. Every request is recorded.
#[derive(Default)]
pub struct ScriptedLlm {
    responses: Mutex<VecDeque<Result<MessageResponse, LlmError>>>,
    requests: Mutex<Vec<MessageRequest>>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, response: MessageResponse) -> &Self {
        self.responses.lock().push_back(Ok(response));
        self
    }

    pub fn push_text(&self, text: impl Into<String>) -> &Self {
        self.push(MessageResponse::text(text))
    }

    pub fn push_error(&self, error: LlmError) -> &Self {
        self.responses.lock().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<MessageRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().len()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn create_message(&self, request: MessageRequest) -> Result<MessageResponse, LlmError> {
        self.requests.lock().push(request);
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::Unavailable("script exhausted".to_string())))
    }
}
