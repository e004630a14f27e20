//! In-memory `PromptClient` doubles for engine and handler tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::llm_client::{LlmError, PromptClient, PromptTemplate, PromptVars};

/// Replies from a queue and records the variables of every call.
/// Once the queue is empty every call fails with `EmptyContent`.
#[derive(Default)]
pub struct ScriptedClient {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    calls: Mutex<Vec<Vec<(String, String)>>>,
}

impl ScriptedClient {
    pub fn new(replies: impl IntoIterator<Item = Result<String, LlmError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn replying(text: &str) -> Arc<Self> {
        Self::new([Ok(text.to_string())])
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<Vec<(String, String)>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PromptClient for ScriptedClient {
    async fn generate(
        &self,
        _template: &PromptTemplate,
        vars: &PromptVars<'_>,
    ) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(
            vars.iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        );
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LlmError::EmptyContent))
    }
}

/// Never answers within any reasonable timeout.
pub struct StalledClient;

#[async_trait]
impl PromptClient for StalledClient {
    async fn generate(
        &self,
        _template: &PromptTemplate,
        _vars: &PromptVars<'_>,
    ) -> Result<String, LlmError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok("{}".to_string())
    }
}
