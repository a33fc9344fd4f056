// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for Cairn.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across all Cairn adapter traits and core operations.
#[derive(Debug, Error)]
pub enum CairnError {
    /// Configuration errors (invalid TOML, bad values, inconsistent wiring).
    #[error("configuration error: {0}")]
    Config(String),

    /// An embedding vector did not have the configured dimension.
    #[error("configuration error: embedding dimension mismatch (expected {expected}, got {actual})")]
    EmbeddingDimension { expected: usize, actual: usize },

    /// No agent is registered under the requested name.
    #[error("agent not found: {name}")]
    AgentNotFound { name: String },

    /// A document was declared in a format the extractor cannot read.
    #[error("unsupported document format: {format}")]
    UnsupportedFormat { format: String },

    /// Storage backend errors (database connection, query failure, file I/O, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Embedding or completion provider errors (unreachable backend, bad response).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A tool failed while executing.
    #[error("tool `{tool}` failed: {message}")]
    ToolExecution { tool: String, message: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CairnError {
    /// Wraps any error as a storage failure.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            source: Box::new(err),
        }
    }

    /// Builds a provider error without an underlying source.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
            source: None,
        }
    }

    /// Builds a tool execution error.
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecution {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Whether the failure is scoped to a single call and may succeed on retry.
    ///
    /// Configuration errors are never recoverable: they fail fast at the boundary.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Provider { .. } | Self::Timeout { .. } | Self::ToolExecution { .. } | Self::Storage { .. }
        )
    }

    /// Whether this error belongs to the configuration class.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::EmbeddingDimension { .. }
                | Self::AgentNotFound { .. }
                | Self::UnsupportedFormat { .. }
        )
    }

    /// Text suitable for showing to an end user in place of an assistant reply.
    pub fn user_message(&self) -> String {
        match self {
            Self::Provider { .. } => {
                "The language model backend is unavailable right now. Please try again.".to_string()
            }
            Self::Timeout { .. } => {
                "The language model took too long to respond. Please try again.".to_string()
            }
            Self::AgentNotFound { name } => format!("No agent named \"{name}\" is configured."),
            Self::UnsupportedFormat { format } => {
                format!("Documents of type \"{format}\" cannot be read.")
            }
            Self::Storage { .. } => "Stored data could not be accessed.".to_string(),
            Self::Config(_) | Self::EmbeddingDimension { .. } => {
                "Cairn is misconfigured; check the logs for details.".to_string()
            }
            Self::ToolExecution { tool, message } => format!("Tool {tool} failed: {message}"),
            Self::Internal(_) => "Something went wrong while handling the request.".to_string(),
        }
    }
}
