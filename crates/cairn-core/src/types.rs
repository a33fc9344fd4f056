// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Cairn crates.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of external collaborator an adapter talks to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Embedding,
    Completion,
    ToolHost,
}

/// Author of a chat message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A single `{role, content}` entry in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Tool name for `tool`-role messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Calls requested by an `assistant` message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            name: None,
            tool_calls: Vec::new(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// An assistant message that asks for `calls` to be run.
    pub fn assistant_calls(content: impl Into<String>, calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: calls,
            ..Self::new(Role::Assistant, content)
        }
    }

    /// A tool result message attributed to `tool`.
    pub fn tool(tool: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: Some(tool.into()),
            ..Self::new(Role::Tool, content)
        }
    }
}

// --- Embedding types ---

/// Input for an embedding adapter.
#[derive(Debug, Clone)]
pub struct EmbeddingInput {
    /// Texts to embed, one vector per entry.
    pub texts: Vec<String>,
}

/// Output from an embedding adapter.
#[derive(Debug, Clone)]
pub struct EmbeddingOutput {
    /// Vectors in the same order as the input texts.
    pub embeddings: Vec<Vec<f32>>,
    /// Dimension reported by the backend for this batch.
    pub dimensions: usize,
}

// --- Completion types ---

/// A tool advertised to the completion provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema describing the tool's parameters.
    pub parameters: serde_json::Value,
}

/// A tool invocation requested by the completion provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

/// A request to a completion provider.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Model override; `None` uses the adapter's configured model.
    pub model: Option<String>,
    pub system_prompt: String,
    /// Conversation history, including `tool`-role result messages.
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub tools: Vec<ToolDefinition>,
}

/// A whole (non-streamed) response from a completion provider.
#[derive(Debug, Clone, Default)]
pub struct CompletionResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub model: String,
}

// --- Tool host types ---

/// A tool advertised by an external tool host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostedToolInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "input_schema", skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
}

/// Result of a `call_tool` round trip: `{success, data | error}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostedCallOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// --- Document types ---

/// Declared format of a document handed to a text extractor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    PlainText,
    Markdown,
    Pdf,
    Docx,
    /// Anything else, carrying the declared extension or MIME label.
    Other(String),
}

impl DocumentFormat {
    /// Parses a declared format label such as `md` or `.PDF`.
    pub fn parse(label: &str) -> Self {
        let label = label.trim().trim_start_matches('.').to_ascii_lowercase();
        match label.as_str() {
            "txt" | "text" | "text/plain" => Self::PlainText,
            "md" | "markdown" | "text/markdown" => Self::Markdown,
            "pdf" | "application/pdf" => Self::Pdf,
            "docx" => Self::Docx,
            _ => Self::Other(label),
        }
    }

    /// Infers the format from a file name's extension.
    pub fn from_path(path: &std::path::Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => Self::parse(ext),
            None => Self::Other(String::new()),
        }
    }

    /// Short label used in metadata and error messages.
    pub fn label(&self) -> &str {
        match self {
            Self::PlainText => "txt",
            Self::Markdown => "md",
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Other(s) => s,
        }
    }
}
