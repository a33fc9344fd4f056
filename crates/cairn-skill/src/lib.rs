// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tools for Cairn agents.
//!
//! Every tool an agent can call is an [`AgentTool`]: either a
//! [`BuiltinTool`] running in-process or a [`HostedTool`] discovered from an
//! external tool host. Both implement [`Tool`], so the [`ToolRegistry`]
//! dispatches without caring where a tool lives. Dispatch never fails: tool
//! errors come back as `{"error": message}` payloads.
//!
//! Built-in tools:
//! - [`builtin::SearchDocumentsTool`] -- query the document store
//! - [`builtin::RecallConversationTool`] -- search saved conversations
//! - [`builtin::ExecuteCodeTool`] -- run a snippet in a local interpreter

pub mod builtin;
pub mod hosted;
pub mod tool;

pub use builtin::{BuiltinContext, BuiltinTool};
pub use hosted::{discover_tools, HostedTool, HttpToolHost};
pub use tool::{AgentTool, Tool, ToolRegistry, ToolResult};
