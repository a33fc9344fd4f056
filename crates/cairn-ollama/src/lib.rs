// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ollama adapters for Cairn.
//!
//! [`OllamaEmbedder`] implements [`EmbeddingAdapter`] over `/api/embeddings`
//! and [`OllamaCompletion`] implements [`CompletionAdapter`] over a
//! non-streamed `/api/chat`.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use cairn_config::CairnConfig;
use cairn_core::error::CairnError;
use cairn_core::traits::{CompletionAdapter, EmbeddingAdapter, PluginAdapter};
use cairn_core::types::{
    AdapterType, ChatMessage, CompletionRequest, CompletionResponse, EmbeddingInput,
    EmbeddingOutput, HealthStatus, ToolCall,
};
use tracing::{debug, info};

use crate::client::OllamaClient;
use crate::types::{
    ChatFunction, ChatOptions, ChatRequest, ChatResponse, ChatTool, EmbeddingRequest,
    EmbeddingResponse,
};

async fn health_of(client: &OllamaClient) -> Result<HealthStatus, CairnError> {
    match client.list_models().await {
        Ok(_) => Ok(HealthStatus::Healthy),
        Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
    }
}

/// Embedding adapter backed by an Ollama embedding model.
pub struct OllamaEmbedder {
    client: OllamaClient,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(config: &CairnConfig) -> Result<Self, CairnError> {
        let client = OllamaClient::new(
            &config.embedding.host,
            Duration::from_secs(config.embedding.timeout_secs),
        )?;
        info!(host = client.base_url(), model = %config.embedding.model, "Ollama embedder initialized");
        Ok(Self::with_client(client, config.embedding.model.clone()))
    }

    pub fn with_client(client: OllamaClient, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl PluginAdapter for OllamaEmbedder {
    fn name(&self) -> &str {
        "ollama-embedding"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, CairnError> {
        health_of(&self.client).await
    }
}

#[async_trait]
impl EmbeddingAdapter for OllamaEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, CairnError> {
        let mut embeddings = Vec::with_capacity(input.texts.len());
        for text in input.texts {
            let request = EmbeddingRequest {
                model: self.model.clone(),
                prompt: text,
            };
            let response: EmbeddingResponse =
                self.client.post_json("/api/embeddings", &request).await?;
            if response.embedding.is_empty() {
                return Err(CairnError::provider(format!(
                    "Ollama model `{}` returned an empty embedding",
                    self.model
                )));
            }
            embeddings.push(response.embedding);
        }
        let dimensions = embeddings.first().map_or(0, Vec::len);
        debug!(count = embeddings.len(), dimensions, "embeddings generated");
        Ok(EmbeddingOutput {
            embeddings,
            dimensions,
        })
    }
}

/// Chat completion adapter backed by an Ollama chat model.
pub struct OllamaCompletion {
    client: OllamaClient,
    model: String,
}

impl OllamaCompletion {
    pub fn new(config: &CairnConfig) -> Result<Self, CairnError> {
        let client = OllamaClient::new(
            &config.completion.host,
            Duration::from_secs(config.completion.timeout_secs),
        )?;
        info!(host = client.base_url(), model = %config.completion.model, "Ollama completion initialized");
        Ok(Self::with_client(client, config.completion.model.clone()))
    }

    pub fn with_client(client: OllamaClient, model: String) -> Self {
        Self { client, model }
    }

    fn to_chat_request(&self, request: CompletionRequest) -> ChatRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if !request.system_prompt.is_empty() {
            messages.push(wire_message(&ChatMessage::system(request.system_prompt)));
        }
        messages.extend(request.messages.iter().map(wire_message));

        let tools = request
            .tools
            .into_iter()
            .map(|t| ChatTool {
                kind: "function",
                function: ChatFunction {
                    name: t.name,
                    description: t.description,
                    parameters: t.parameters,
                },
            })
            .collect();

        ChatRequest {
            model: request.model.unwrap_or_else(|| self.model.clone()),
            messages,
            stream: false,
            options: ChatOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
            tools,
        }
    }
}

fn wire_message(message: &ChatMessage) -> types::ChatMessage {
    types::ChatMessage {
        role: message.role.to_string(),
        content: message.content.clone(),
        tool_calls: message
            .tool_calls
            .iter()
            .map(|c| types::ChatToolCall {
                function: types::ChatToolCallFunction {
                    name: c.name.clone(),
                    arguments: c.arguments.clone(),
                },
            })
            .collect(),
    }
}

#[async_trait]
impl PluginAdapter for OllamaCompletion {
    fn name(&self) -> &str {
        "ollama-chat"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Completion
    }

    async fn health_check(&self) -> Result<HealthStatus, CairnError> {
        health_of(&self.client).await
    }
}

#[async_trait]
impl CompletionAdapter for OllamaCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, CairnError> {
        let body = self.to_chat_request(request);
        let response: ChatResponse = self.client.post_json("/api/chat", &body).await?;

        let tool_calls = response
            .message
            .tool_calls
            .into_iter()
            .map(|c| ToolCall {
                name: c.function.name,
                arguments: c.function.arguments,
            })
            .collect::<Vec<_>>();
        debug!(model = %response.model, tool_calls = tool_calls.len(), "chat response received");

        Ok(CompletionResponse {
            content: response.message.content,
            tool_calls,
            model: response.model,
        })
    }
}
