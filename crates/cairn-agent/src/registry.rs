// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The set of configured agents, built once at startup.

use std::collections::HashMap;
use std::sync::Arc;

use cairn_config::{AgentSpecConfig, CairnConfig};
use cairn_core::{CairnError, CompletionAdapter, ToolHost};
use cairn_memory::RetrievalEngine;
use cairn_skill::{discover_tools, AgentTool, BuiltinContext, BuiltinTool, HostedTool, Tool, ToolRegistry};
use cairn_storage::ConversationStore;
use tracing::{info, warn};

use crate::agent::{Agent, AgentRuntime};

/// Tool name that binds every tool the host advertised.
pub const HOSTED_WILDCARD: &str = "hosted:*";

/// Collaborators shared by every agent.
pub struct AgentDeps {
    pub completion: Arc<dyn CompletionAdapter>,
    pub retrieval: Arc<RetrievalEngine>,
    pub conversations: Arc<ConversationStore>,
    /// `None` when no tool host is configured.
    pub tool_host: Option<Arc<dyn ToolHost>>,
}

/// Named agents. Lookups hand out the same shared instance every time.
pub struct AgentRegistry {
    agents: HashMap<String, Arc<Agent>>,
    order: Vec<String>,
}

impl AgentRegistry {
    /// Build every configured agent.
    ///
    /// Hosted tools are discovered once. If discovery fails the registry is
    /// still built, with only built-in tools bound.
    pub async fn build(config: &CairnConfig, deps: AgentDeps) -> Result<Self, CairnError> {
        let hosted = match &deps.tool_host {
            Some(host) => match discover_tools(host.clone()).await {
                Ok(tools) => tools,
                Err(e) => {
                    warn!(host = host.name(), error = %e, "tool discovery failed, continuing without hosted tools");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let ctx = BuiltinContext {
            retrieval: deps.retrieval.clone(),
            conversations: deps.conversations,
            tools: config.tools.clone(),
        };
        let runtime = AgentRuntime {
            completion: deps.completion,
            retrieval: deps.retrieval,
            history_window: config.completion.history_window,
            max_tool_rounds: config.completion.max_tool_rounds,
            max_tokens: config.completion.max_tokens,
        };

        let mut agents = HashMap::new();
        let mut order = Vec::new();
        for spec in config.effective_agents() {
            if agents.contains_key(&spec.name) {
                return Err(CairnError::Config(format!("duplicate agent name `{}`", spec.name)));
            }
            let (tools, missing) = bind_tools(&spec, &ctx, &hosted);
            if !missing.is_empty() {
                warn!(agent = %spec.name, missing = ?missing, "some configured tools are unavailable");
            }
            let agent = Agent::new(&spec, tools, missing, runtime.clone());
            order.push(spec.name.clone());
            agents.insert(spec.name, Arc::new(agent));
        }

        info!(agents = order.len(), hosted_tools = hosted.len(), "agent registry built");
        Ok(Self { agents, order })
    }

    /// Look up an agent by exact name.
    pub fn get(&self, name: &str) -> Result<Arc<Agent>, CairnError> {
        self.agents
            .get(name)
            .cloned()
            .ok_or_else(|| CairnError::AgentNotFound {
                name: name.to_string(),
            })
    }

    /// Agent names in configuration order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Resolve an agent's tool names; returns the bound tools and the names that matched nothing.
fn bind_tools(
    spec: &AgentSpecConfig,
    ctx: &BuiltinContext,
    hosted: &[HostedTool],
) -> (ToolRegistry, Vec<String>) {
    let mut registry = ToolRegistry::new();
    let mut missing = Vec::new();

    for name in &spec.tools {
        if name == HOSTED_WILDCARD {
            for tool in hosted {
                registry.register(AgentTool::Hosted(tool.clone()));
            }
        } else if let Some(builtin) = BuiltinTool::from_name(name, ctx) {
            registry.register(AgentTool::Builtin(builtin));
        } else if let Some(tool) = hosted.iter().find(|t| t.name() == name) {
            registry.register(AgentTool::Hosted(tool.clone()));
        } else {
            missing.push(name.clone());
        }
    }

    (registry, missing)
}
