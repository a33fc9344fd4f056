// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool trait and per-agent registry.
//!
//! The [`Tool`] trait is the single capability interface that built-in and
//! hosted tools implement. The [`ToolRegistry`] keeps one agent's tools in
//! binding order, generates the definitions sent to the completion provider,
//! and turns every invocation into a [`ToolResult`].

use async_trait::async_trait;
use cairn_core::types::{ToolCall, ToolDefinition};
use cairn_core::CairnError;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::builtin::BuiltinTool;
use crate::hosted::HostedTool;

/// Unified interface for every tool an agent can call.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name used for lookup and in provider requests.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema for the tool's parameters.
    fn parameters_schema(&self) -> Value;

    /// Run the tool. Failures are returned, never panicked.
    async fn execute(&self, parameters: Value) -> Result<Value, CairnError>;
}

/// A tool bound to an agent: in-process or hosted elsewhere.
pub enum AgentTool {
    Builtin(BuiltinTool),
    Hosted(HostedTool),
}

impl AgentTool {
    pub fn is_hosted(&self) -> bool {
        matches!(self, Self::Hosted(_))
    }
}

#[async_trait]
impl Tool for AgentTool {
    fn name(&self) -> &str {
        match self {
            Self::Builtin(t) => t.name(),
            Self::Hosted(t) => t.name(),
        }
    }

    fn description(&self) -> &str {
        match self {
            Self::Builtin(t) => t.description(),
            Self::Hosted(t) => t.description(),
        }
    }

    fn parameters_schema(&self) -> Value {
        match self {
            Self::Builtin(t) => t.parameters_schema(),
            Self::Hosted(t) => t.parameters_schema(),
        }
    }

    async fn execute(&self, parameters: Value) -> Result<Value, CairnError> {
        match self {
            Self::Builtin(t) => t.execute(parameters).await,
            Self::Hosted(t) => t.execute(parameters).await,
        }
    }
}

/// Outcome of one dispatched tool call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResult {
    pub tool: String,
    pub success: bool,
    /// The tool's output, or `{"error": message}` on failure.
    pub payload: Value,
}

impl ToolResult {
    pub fn failure(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            success: false,
            payload: json!({ "error": message.into() }),
        }
    }

    /// The error message when this result is a failure.
    pub fn error(&self) -> Option<&str> {
        if self.success {
            return None;
        }
        self.payload.get("error").and_then(Value::as_str)
    }

    /// Payload rendered for a `tool`-role chat message.
    pub fn to_message_content(&self) -> String {
        match &self.payload {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Text shown to the model for a failed tool.
fn error_text(e: &CairnError) -> String {
    match e {
        CairnError::ToolExecution { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

/// Accept arguments as an object, a JSON-encoded string, or nothing.
fn normalize_arguments(arguments: &Value) -> Value {
    match arguments {
        Value::Null => json!({}),
        Value::String(s) => serde_json::from_str(s).unwrap_or_else(|_| json!({ "input": s })),
        other => other.clone(),
    }
}

/// One agent's tools, in binding order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<AgentTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tool. A tool with the same name is replaced in place.
    pub fn register(&mut self, tool: AgentTool) {
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(i) => {
                debug!(tool = tool.name(), "replacing tool with same name");
                self.tools[i] = tool;
            }
            None => self.tools.push(tool),
        }
    }

    pub fn get(&self, name: &str) -> Option<&AgentTool> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Definitions for the completion provider, in binding order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters_schema(),
            })
            .collect()
    }

    /// A `- name: description` line per tool, for the system prompt.
    pub fn catalogue(&self) -> String {
        self.tools
            .iter()
            .map(|t| format!("- {}: {}", t.name(), t.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Run `call` against the bound tool of that name.
    ///
    /// Never returns an error: unknown tools and tool failures both produce
    /// a [`ToolResult`] with `success == false` and an `{"error"}` payload.
    pub async fn dispatch(&self, call: &ToolCall) -> ToolResult {
        let Some(tool) = self.get(&call.name) else {
            warn!(tool = %call.name, "model requested a tool that is not bound");
            return ToolResult::failure(&call.name, format!("unknown tool `{}`", call.name));
        };

        let arguments = normalize_arguments(&call.arguments);
        match tool.execute(arguments).await {
            Ok(payload) => {
                debug!(tool = %call.name, hosted = tool.is_hosted(), "tool succeeded");
                ToolResult {
                    tool: call.name.clone(),
                    success: true,
                    payload,
                }
            }
            Err(e) => {
                warn!(tool = %call.name, hosted = tool.is_hosted(), error = %e, "tool failed");
                ToolResult::failure(&call.name, error_text(&e))
            }
        }
    }
}
