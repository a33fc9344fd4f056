// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in tools, always available without a tool host.

pub mod code;
pub mod recall;
pub mod search;

pub use code::ExecuteCodeTool;
pub use recall::RecallConversationTool;
pub use search::SearchDocumentsTool;

use std::sync::Arc;

use async_trait::async_trait;
use cairn_config::model::ToolsConfig;
use cairn_core::CairnError;
use cairn_memory::RetrievalEngine;
use cairn_storage::ConversationStore;
use serde_json::Value;

use crate::tool::Tool;

/// Names an agent configuration may use to bind a built-in tool.
pub const BUILTIN_NAMES: [&str; 3] = ["search_documents", "recall_conversation", "execute_code"];

/// Shared collaborators the built-in tools are constructed from.
#[derive(Clone)]
pub struct BuiltinContext {
    pub retrieval: Arc<RetrievalEngine>,
    pub conversations: Arc<ConversationStore>,
    pub tools: ToolsConfig,
}

/// The closed set of in-process tools.
pub enum BuiltinTool {
    SearchDocuments(SearchDocumentsTool),
    RecallConversation(RecallConversationTool),
    ExecuteCode(ExecuteCodeTool),
}

impl BuiltinTool {
    /// Construct the built-in called `name`, if there is one.
    pub fn from_name(name: &str, ctx: &BuiltinContext) -> Option<Self> {
        match name {
            "search_documents" => Some(Self::SearchDocuments(SearchDocumentsTool::new(
                ctx.retrieval.clone(),
            ))),
            "recall_conversation" => Some(Self::RecallConversation(RecallConversationTool::new(
                ctx.conversations.clone(),
            ))),
            "execute_code" => Some(Self::ExecuteCode(ExecuteCodeTool::new(&ctx.tools))),
            _ => None,
        }
    }

    fn inner(&self) -> &dyn Tool {
        match self {
            Self::SearchDocuments(t) => t,
            Self::RecallConversation(t) => t,
            Self::ExecuteCode(t) => t,
        }
    }
}

#[async_trait]
impl Tool for BuiltinTool {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn description(&self) -> &str {
        self.inner().description()
    }

    fn parameters_schema(&self) -> Value {
        self.inner().parameters_schema()
    }

    async fn execute(&self, parameters: Value) -> Result<Value, CairnError> {
        self.inner().execute(parameters).await
    }
}

/// Read an optional positive integer argument, falling back to `default`.
pub(crate) fn limit_arg(parameters: &Value, default: usize) -> usize {
    parameters
        .get("limit")
        .and_then(Value::as_u64)
        .map(|n| n as usize)
        .filter(|n| *n > 0)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_memory::{JsonVectorStore, StoreOptions};
    use cairn_test_utils::MockEmbedder;

    fn context(dir: &tempfile::TempDir) -> BuiltinContext {
        let store = Arc::new(JsonVectorStore::new(
            dir.path().join("v.json"),
            Arc::new(MockEmbedder::new(8)),
            StoreOptions {
                dimension: 8,
                untagged: Default::default(),
            },
        ));
        BuiltinContext {
            retrieval: Arc::new(RetrievalEngine::new(store, None, 2, 5)),
            conversations: Arc::new(ConversationStore::new(dir.path().join("c.json"))),
            tools: ToolsConfig::default(),
        }
    }

    #[test]
    fn every_builtin_name_constructs() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        for name in BUILTIN_NAMES {
            let tool = BuiltinTool::from_name(name, &ctx).unwrap();
            assert_eq!(tool.name(), name);
            assert!(!tool.description().is_empty());
            assert_eq!(tool.parameters_schema()["type"], "object");
        }
        assert!(BuiltinTool::from_name("web_search", &ctx).is_none());
    }

    #[test]
    fn limit_defaults_when_missing_or_zero() {
        assert_eq!(limit_arg(&serde_json::json!({}), 5), 5);
        assert_eq!(limit_arg(&serde_json::json!({"limit": 0}), 5), 5);
        assert_eq!(limit_arg(&serde_json::json!({"limit": 2}), 5), 2);
    }
}
