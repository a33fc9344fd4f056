// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Cairn.
//!
//! Deterministic stand-ins for the external collaborators so tests run
//! without an Ollama server or a tool host.
//!
//! # Components
//!
//! - [`MockEmbedder`] - bag-of-words vectors, scripted vectors, failure injection
//! - [`MockCompletion`] - scripted completion replies, records every request
//! - [`MockToolHost`] - in-memory tool host with canned outcomes

pub mod mock_completion;
pub mod mock_embedder;
pub mod mock_tool_host;

pub use mock_completion::MockCompletion;
pub use mock_embedder::MockEmbedder;
pub use mock_tool_host::MockToolHost;
