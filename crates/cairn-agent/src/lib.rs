// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agents for Cairn.
//!
//! An [`Agent`] pairs a persona prompt with a bound tool set and runs
//! conversation turns against a completion provider. The [`AgentRegistry`]
//! builds every configured agent once and hands out shared instances by name.

pub mod agent;
pub mod prompt;
pub mod registry;

pub use agent::{Agent, AgentRuntime, TurnOptions, TurnReply};
pub use registry::{AgentDeps, AgentRegistry, HOSTED_WILDCARD};
