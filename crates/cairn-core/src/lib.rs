// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Cairn.
//!
//! This crate provides the error type, shared message and request types, and
//! the adapter traits for Cairn's external collaborators (embedding backend,
//! completion backend, text extractor, tool host).

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::CairnError;
pub use types::{
    AdapterType, ChatMessage, CompletionRequest, CompletionResponse, DocumentFormat,
    EmbeddingInput, EmbeddingOutput, HealthStatus, HostedCallOutcome, HostedToolInfo, Role,
    ToolCall, ToolDefinition,
};

pub use traits::{CompletionAdapter, EmbeddingAdapter, PluginAdapter, TextExtractor, ToolHost};
