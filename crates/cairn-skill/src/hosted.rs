// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tools provided by an external tool host.
//!
//! [`discover_tools`] asks the host for its catalogue once and wraps each
//! entry as a [`HostedTool`]. [`HttpToolHost`] is the HTTP client for hosts
//! that expose `GET /tools`, `POST /tools/{name}` and `GET /health`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cairn_config::model::ToolHostConfig;
use cairn_core::traits::{PluginAdapter, ToolHost};
use cairn_core::types::{AdapterType, HealthStatus, HostedCallOutcome, HostedToolInfo};
use cairn_core::CairnError;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::tool::Tool;

/// A tool executed by a remote host.
#[derive(Clone)]
pub struct HostedTool {
    info: HostedToolInfo,
    host: Arc<dyn ToolHost>,
}

impl HostedTool {
    pub fn new(info: HostedToolInfo, host: Arc<dyn ToolHost>) -> Self {
        Self { info, host }
    }
}

#[async_trait]
impl Tool for HostedTool {
    fn name(&self) -> &str {
        &self.info.name
    }

    fn description(&self) -> &str {
        &self.info.description
    }

    fn parameters_schema(&self) -> Value {
        self.info
            .parameters
            .clone()
            .unwrap_or_else(|| json!({"type": "object", "properties": {}}))
    }

    async fn execute(&self, parameters: Value) -> Result<Value, CairnError> {
        let outcome = self
            .host
            .call_tool(&self.info.name, parameters)
            .await
            .map_err(|e| CairnError::tool(&self.info.name, e.to_string()))?;
        if outcome.success {
            return Ok(outcome.data.unwrap_or(Value::Null));
        }
        Err(CairnError::tool(
            &self.info.name,
            outcome
                .error
                .unwrap_or_else(|| "tool host reported failure".to_string()),
        ))
    }
}

/// List the host's tools once and wrap each as a [`HostedTool`].
pub async fn discover_tools(host: Arc<dyn ToolHost>) -> Result<Vec<HostedTool>, CairnError> {
    let infos = host.list_tools().await?;
    info!(host = host.name(), tools = infos.len(), "hosted tools discovered");
    Ok(infos
        .into_iter()
        .filter(|i| !i.name.trim().is_empty())
        .map(|info| HostedTool::new(info, host.clone()))
        .collect())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ToolList {
    Bare(Vec<HostedToolInfo>),
    Wrapped { tools: Vec<HostedToolInfo> },
}

/// Tool host reached over plain HTTP with optional Bearer auth.
pub struct HttpToolHost {
    client: reqwest::Client,
    base_url: reqwest::Url,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpToolHost {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self, CairnError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CairnError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        let base_url = reqwest::Url::parse(base_url)
            .ok()
            .filter(|u| !u.cannot_be_a_base())
            .ok_or_else(|| CairnError::Config(format!("invalid tool host url `{base_url}`")))?;
        Ok(Self {
            client,
            base_url,
            api_key: api_key.filter(|k| !k.is_empty()),
            timeout,
        })
    }

    pub fn from_config(config: &ToolHostConfig) -> Result<Self, CairnError> {
        Self::new(
            &config.url,
            config.api_key.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Each segment is percent-encoded, so a tool name cannot change the route.
    fn request(
        &self,
        method: reqwest::Method,
        segments: &[&str],
    ) -> Result<reqwest::RequestBuilder, CairnError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| CairnError::Internal(format!("tool host url `{}` has no path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        let builder = self.client.request(method, url);
        Ok(match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> CairnError {
        if e.is_timeout() {
            CairnError::Timeout {
                duration: self.timeout,
            }
        } else {
            CairnError::Provider {
                message: format!("tool host request failed: {e}"),
                source: Some(Box::new(e)),
            }
        }
    }
}

#[async_trait]
impl PluginAdapter for HttpToolHost {
    fn name(&self) -> &str {
        "http-tool-host"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ToolHost
    }

    async fn health_check(&self) -> Result<HealthStatus, CairnError> {
        let request = match self.request(reqwest::Method::GET, &["health"]) {
            Ok(request) => request,
            Err(e) => return Ok(HealthStatus::Unhealthy(e.to_string())),
        };
        match request.send().await {
            Ok(r) if r.status().is_success() => Ok(HealthStatus::Healthy),
            Ok(r) => Ok(HealthStatus::Degraded(format!("health returned {}", r.status()))),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }
}

#[async_trait]
impl ToolHost for HttpToolHost {
    async fn list_tools(&self) -> Result<Vec<HostedToolInfo>, CairnError> {
        let response = self
            .request(reqwest::Method::GET, &["tools"])?
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(CairnError::provider(format!("tool host returned {status} listing tools")));
        }
        let list: ToolList = response.json().await.map_err(|e| self.transport_error(e))?;
        Ok(match list {
            ToolList::Bare(tools) | ToolList::Wrapped { tools } => tools,
        })
    }

    async fn call_tool(&self, name: &str, parameters: Value) -> Result<HostedCallOutcome, CairnError> {
        let response = self
            .request(reqwest::Method::POST, &["tools", name])?
            .json(&parameters)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        debug!(tool = name, status = %status, "tool host call returned");

        // A structured {success, error} body is honoured whatever the status.
        if let Ok(outcome) = serde_json::from_str::<HostedCallOutcome>(&body) {
            return Ok(outcome);
        }
        if status.is_success() {
            return Err(CairnError::provider(format!(
                "tool host returned an unrecognised body for `{name}`"
            )));
        }
        Err(CairnError::provider(format!("tool host returned {status}: {body}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_test_utils::MockToolHost;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn host(server: &MockServer, key: Option<&str>) -> HttpToolHost {
        HttpToolHost::new(&server.uri(), key.map(String::from), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn lists_bare_and_wrapped_catalogues() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tools"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"name": "web_search", "description": "Search the web"}
            ])))
            .mount(&server)
            .await;
        let tools = host(&server, Some("secret")).list_tools().await.unwrap();
        assert_eq!(tools[0].name, "web_search");

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tools"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tools": [
                {"name": "fetch", "description": "Fetch a URL", "input_schema": {"type": "object"}}
            ]})))
            .mount(&server)
            .await;
        let tools = host(&server, None).list_tools().await.unwrap();
        assert_eq!(tools[0].name, "fetch");
        assert_eq!(tools[0].parameters, Some(json!({"type": "object"})));
    }

    #[tokio::test]
    async fn call_posts_parameters_and_reads_outcome() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tools/web_search"))
            .and(body_json(json!({"query": "rust"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": {"hits": 3}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let outcome = host(&server, None)
            .call_tool("web_search", json!({"query": "rust"}))
            .await
            .unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.data, Some(json!({"hits": 3})));
    }

    #[tokio::test]
    async fn tool_name_is_a_single_escaped_path_segment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tools/a%2Fb%3Fx%23y"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = host(&server, None).call_tool("a/b?x#y", json!({})).await.unwrap();
        assert!(outcome.success);
    }

    #[tokio::test]
    async fn base_path_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tools"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let host = HttpToolHost::new(&format!("{}/api/", server.uri()), None, Duration::from_secs(5))
            .unwrap();
        assert!(host.list_tools().await.unwrap().is_empty());
    }

    #[test]
    fn invalid_url_is_a_configuration_error() {
        let err = HttpToolHost::new("not a url", None, Duration::from_secs(5)).err().unwrap();
        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn failure_body_on_error_status_is_outcome() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tools/broken"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({"success": false, "error": "boom"})),
            )
            .mount(&server)
            .await;

        let outcome = host(&server, None).call_tool("broken", json!({})).await.unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn health_check_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        assert_eq!(host(&server, None).health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn discovery_wraps_every_tool() {
        let mock = Arc::new(MockToolHost::new().with_tool("a", "A").with_tool("b", "B"));
        let tools = discover_tools(mock).await.unwrap();
        let names: Vec<_> = tools.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(tools[0].parameters_schema()["type"], "object");
    }

    #[tokio::test]
    async fn discovery_failure_is_returned() {
        let mock = Arc::new(MockToolHost::unreachable());
        assert!(discover_tools(mock).await.is_err());
    }

    #[tokio::test]
    async fn hosted_failure_maps_to_tool_error() {
        let mock = Arc::new(MockToolHost::new().with_tool("t", "T").with_outcome(
            "t",
            HostedCallOutcome {
                success: false,
                data: None,
                error: None,
            },
        ));
        let tools = discover_tools(mock).await.unwrap();
        let err = tools[0].execute(json!({})).await.unwrap_err();
        assert!(matches!(err, CairnError::ToolExecution { .. }));
        assert!(err.to_string().contains("tool host reported failure"));
    }
}
