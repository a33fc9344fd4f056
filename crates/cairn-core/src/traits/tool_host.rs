// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait for external tool-hosting services.

use async_trait::async_trait;

use crate::error::CairnError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{HostedCallOutcome, HostedToolInfo};

/// A remote service that advertises and executes tools.
#[async_trait]
pub trait ToolHost: PluginAdapter {
    /// Lists the tools the host currently offers.
    async fn list_tools(&self) -> Result<Vec<HostedToolInfo>, CairnError>;

    /// Invokes a hosted tool by name.
    ///
    /// Transport failures are `Err`; a tool that ran and reported failure is
    /// `Ok` with `success == false`.
    async fn call_tool(
        &self,
        name: &str,
        parameters: serde_json::Value,
    ) -> Result<HostedCallOutcome, CairnError>;
}
