// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory tool host.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use cairn_core::traits::adapter::PluginAdapter;
use cairn_core::traits::tool_host::ToolHost;
use cairn_core::types::{AdapterType, HealthStatus, HostedCallOutcome, HostedToolInfo};
use cairn_core::CairnError;

/// A tool host whose catalogue and call outcomes are fixed up front.
///
/// Tools without a canned outcome echo their parameters back as `data`.
/// An unreachable host fails every call with a provider error.
pub struct MockToolHost {
    tools: Vec<HostedToolInfo>,
    outcomes: HashMap<String, HostedCallOutcome>,
    unreachable: bool,
    calls: Mutex<Vec<(String, Value)>>,
}

impl MockToolHost {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            outcomes: HashMap::new(),
            unreachable: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A host that cannot be contacted.
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::new()
        }
    }

    pub fn with_tool(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.tools.push(HostedToolInfo {
            name: name.into(),
            description: description.into(),
            parameters: None,
        });
        self
    }

    pub fn with_outcome(mut self, name: impl Into<String>, outcome: HostedCallOutcome) -> Self {
        self.outcomes.insert(name.into(), outcome);
        self
    }

    /// Calls received so far as `(tool, parameters)`.
    pub async fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().await.clone()
    }

    fn offline() -> CairnError {
        CairnError::provider("mock tool host: connection refused")
    }
}

impl Default for MockToolHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockToolHost {
    fn name(&self) -> &str {
        "mock-tool-host"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ToolHost
    }

    async fn health_check(&self) -> Result<HealthStatus, CairnError> {
        if self.unreachable {
            return Ok(HealthStatus::Unhealthy("unreachable".to_string()));
        }
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ToolHost for MockToolHost {
    async fn list_tools(&self) -> Result<Vec<HostedToolInfo>, CairnError> {
        if self.unreachable {
            return Err(Self::offline());
        }
        Ok(self.tools.clone())
    }

    async fn call_tool(&self, name: &str, parameters: Value) -> Result<HostedCallOutcome, CairnError> {
        if self.unreachable {
            return Err(Self::offline());
        }
        self.calls
            .lock()
            .await
            .push((name.to_string(), parameters.clone()));
        Ok(self
            .outcomes
            .get(name)
            .cloned()
            .unwrap_or(HostedCallOutcome {
                success: true,
                data: Some(parameters),
                error: None,
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn echoes_parameters_by_default() {
        let host = MockToolHost::new().with_tool("web_search", "Search the web");
        assert_eq!(host.list_tools().await.unwrap()[0].name, "web_search");

        let out = host.call_tool("web_search", json!({"q": "rust"})).await.unwrap();
        assert!(out.success);
        assert_eq!(out.data, Some(json!({"q": "rust"})));
        assert_eq!(host.calls().await.len(), 1);
    }

    #[tokio::test]
    async fn unreachable_host_errors() {
        let host = MockToolHost::unreachable();
        assert!(host.list_tools().await.is_err());
        assert!(host.call_tool("x", json!({})).await.is_err());
    }
}
