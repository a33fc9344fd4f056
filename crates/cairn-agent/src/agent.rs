// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A single agent and its turn loop.
//!
//! A turn appends the user message, optionally retrieves document context,
//! asks the completion provider for a reply, runs any requested tools, and
//! appends the final assistant message. History lives only in memory;
//! persisting a conversation is the caller's job.

use std::sync::Arc;

use cairn_config::AgentSpecConfig;
use cairn_core::types::{ChatMessage, CompletionRequest, Role, ToolCall};
use cairn_core::{CairnError, CompletionAdapter};
use cairn_memory::{format_context, MetadataFilter, RetrievalEngine, SearchHit};
use cairn_skill::{ToolRegistry, ToolResult};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::prompt;

/// Shared collaborators and limits every agent is built with.
#[derive(Clone)]
pub struct AgentRuntime {
    pub completion: Arc<dyn CompletionAdapter>,
    pub retrieval: Arc<RetrievalEngine>,
    /// Messages of history sent to the provider per call.
    pub history_window: usize,
    /// Provider round trips allowed to request tools within one turn.
    pub max_tool_rounds: usize,
    /// Used when the agent configuration sets no `max_tokens`.
    pub max_tokens: u32,
}

/// Per-call overrides for [`Agent::run_turn`].
#[derive(Debug, Clone, Default)]
pub struct TurnOptions {
    /// Force retrieval on or off; `None` uses the agent default.
    pub retrieval: Option<bool>,
    pub metadata_filter: Option<MetadataFilter>,
}

/// Everything a turn produced.
#[derive(Debug, Clone)]
pub struct TurnReply {
    /// The assistant message, never empty.
    pub message: String,
    pub tool_results: Vec<ToolResult>,
    pub retrieved: Vec<SearchHit>,
}

pub struct Agent {
    name: String,
    system_prompt: String,
    temperature: f32,
    max_tokens: u32,
    retrieval_enabled: bool,
    tools: ToolRegistry,
    missing_tools: Vec<String>,
    runtime: AgentRuntime,
    history: Mutex<Vec<ChatMessage>>,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("tools", &self.tools.names())
            .field("retrieval", &self.retrieval_enabled)
            .finish_non_exhaustive()
    }
}

impl Agent {
    pub fn new(
        spec: &AgentSpecConfig,
        tools: ToolRegistry,
        missing_tools: Vec<String>,
        runtime: AgentRuntime,
    ) -> Self {
        Self {
            name: spec.name.clone(),
            system_prompt: spec.system_prompt.clone(),
            temperature: spec.temperature,
            max_tokens: spec.max_tokens.unwrap_or(runtime.max_tokens),
            retrieval_enabled: spec.retrieval,
            tools,
            missing_tools,
            runtime,
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn retrieval_enabled(&self) -> bool {
        self.retrieval_enabled
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.names()
    }

    /// Tools named in the agent configuration that could not be bound.
    pub fn missing_tools(&self) -> &[String] {
        &self.missing_tools
    }

    /// Snapshot of the in-memory history.
    pub async fn history(&self) -> Vec<ChatMessage> {
        self.history.lock().await.clone()
    }

    pub async fn clear_history(&self) {
        self.history.lock().await.clear();
    }

    /// Run one conversation turn.
    ///
    /// Concurrent turns on the same agent run one after another. On error the
    /// history is restored to its state before the turn, so a failed provider
    /// call leaves no dangling user message.
    pub async fn run_turn(
        &self,
        user_message: &str,
        options: TurnOptions,
    ) -> Result<TurnReply, CairnError> {
        let mut history = self.history.lock().await;
        let checkpoint = history.len();
        history.push(ChatMessage::user(user_message));

        match self.turn(&mut history, user_message, &options).await {
            Ok(reply) => {
                info!(
                    agent = %self.name,
                    tools_called = reply.tool_results.len(),
                    retrieved = reply.retrieved.len(),
                    "turn complete"
                );
                Ok(reply)
            }
            Err(e) => {
                history.truncate(checkpoint);
                warn!(agent = %self.name, error = %e, recoverable = e.is_recoverable(), "turn failed");
                Err(e)
            }
        }
    }

    async fn turn(
        &self,
        history: &mut Vec<ChatMessage>,
        user_message: &str,
        options: &TurnOptions,
    ) -> Result<TurnReply, CairnError> {
        let retrieved = if options.retrieval.unwrap_or(self.retrieval_enabled) {
            let engine = &self.runtime.retrieval;
            engine
                .search(user_message, engine.default_limit(), options.metadata_filter.as_ref())
                .await?
        } else {
            Vec::new()
        };
        let system_prompt = prompt::system_prompt(&self.system_prompt, &self.tools, &format_context(&retrieved));

        let mut tool_results = Vec::new();
        let mut final_text = String::new();

        for round in 0..=self.runtime.max_tool_rounds {
            let response = self
                .runtime
                .completion
                .complete(self.request(&system_prompt, history))
                .await?;

            let calls = self.requested_calls(&response.tool_calls, &response.content);
            if calls.is_empty() {
                final_text = response.content;
                break;
            }
            if round == self.runtime.max_tool_rounds {
                warn!(agent = %self.name, rounds = round, "tool round limit reached, ending turn");
                break;
            }

            history.push(ChatMessage::assistant_calls(response.content, calls.clone()));
            for call in &calls {
                let result = self.tools.dispatch(call).await;
                debug!(agent = %self.name, tool = %result.tool, success = result.success, "tool dispatched");
                history.push(ChatMessage::tool(result.tool.clone(), result.to_message_content()));
                tool_results.push(result);
            }
        }

        let message = if final_text.trim().is_empty() {
            fallback_reply(&tool_results)
        } else {
            final_text
        };
        history.push(ChatMessage::assistant(message.clone()));

        Ok(TurnReply {
            message,
            tool_results,
            retrieved,
        })
    }

    fn request(&self, system_prompt: &str, history: &[ChatMessage]) -> CompletionRequest {
        let mut start = history.len().saturating_sub(self.runtime.history_window);
        // Never open on a tool result without the call that produced it.
        while start > 0 && history[start].role == Role::Tool {
            start -= 1;
        }
        CompletionRequest {
            model: None,
            system_prompt: system_prompt.to_string(),
            messages: history[start..].to_vec(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: self.tools.definitions(),
        }
    }

    /// Structured calls win; otherwise a reply that is only an inline call counts.
    fn requested_calls(&self, structured: &[ToolCall], content: &str) -> Vec<ToolCall> {
        if self.tools.is_empty() {
            return Vec::new();
        }
        if !structured.is_empty() {
            return structured.to_vec();
        }
        prompt::parse_inline_call(content, &self.tools)
            .into_iter()
            .collect()
    }
}

fn fallback_reply(tool_results: &[ToolResult]) -> String {
    if tool_results.is_empty() {
        return "I don't have an answer for that yet.".to_string();
    }
    let failed = tool_results.iter().filter(|r| !r.success).count();
    format!(
        "I ran {} tool call(s) ({} failed) but could not put together a final answer.",
        tool_results.len(),
        failed
    )
}
