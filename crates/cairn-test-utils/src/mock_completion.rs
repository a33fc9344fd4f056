// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock completion adapter for deterministic agent tests.
//!
//! Replies are popped from a FIFO queue. When the queue is empty a default
//! "mock response" text is returned. Every request is recorded so tests can
//! inspect the assembled prompt and history.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use cairn_core::traits::adapter::PluginAdapter;
use cairn_core::traits::completion::CompletionAdapter;
use cairn_core::types::{
    AdapterType, CompletionRequest, CompletionResponse, HealthStatus, ToolCall,
};
use cairn_core::CairnError;

enum Scripted {
    Reply(CompletionResponse),
    Fail(String),
}

pub struct MockCompletion {
    queue: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockCompletion {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Mock pre-loaded with plain text replies.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            queue: Mutex::new(
                responses
                    .into_iter()
                    .map(|text| Scripted::Reply(text_reply(text)))
                    .collect(),
            ),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a plain text reply.
    pub async fn push_text(&self, text: impl Into<String>) {
        self.queue
            .lock()
            .await
            .push_back(Scripted::Reply(text_reply(text.into())));
    }

    /// Queue a reply carrying one structured tool call and no text.
    pub async fn push_tool_call(&self, name: impl Into<String>, arguments: serde_json::Value) {
        let response = CompletionResponse {
            tool_calls: vec![ToolCall {
                name: name.into(),
                arguments,
            }],
            model: "mock-model".to_string(),
            ..Default::default()
        };
        self.queue.lock().await.push_back(Scripted::Reply(response));
    }

    /// Queue a provider failure.
    pub async fn push_error(&self, message: impl Into<String>) {
        self.queue
            .lock()
            .await
            .push_back(Scripted::Fail(message.into()));
    }

    /// Every request received so far, oldest first.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }
}

fn text_reply(text: String) -> CompletionResponse {
    CompletionResponse {
        content: text,
        tool_calls: Vec::new(),
        model: "mock-model".to_string(),
    }
}

impl Default for MockCompletion {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockCompletion {
    fn name(&self) -> &str {
        "mock-completion"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Completion
    }

    async fn health_check(&self) -> Result<HealthStatus, CairnError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl CompletionAdapter for MockCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, CairnError> {
        self.requests.lock().await.push(request);
        match self.queue.lock().await.pop_front() {
            Some(Scripted::Reply(response)) => Ok(response),
            Some(Scripted::Fail(message)) => Err(CairnError::provider(message)),
            None => Ok(text_reply("mock response".to_string())),
        }
    }
}
