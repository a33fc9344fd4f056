// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document search tool.

use std::sync::Arc;

use async_trait::async_trait;
use cairn_core::CairnError;
use cairn_memory::RetrievalEngine;
use serde_json::{json, Value};

use super::limit_arg;
use crate::tool::Tool;

/// Queries the shared document store through the retrieval engine.
pub struct SearchDocumentsTool {
    engine: Arc<RetrievalEngine>,
}

impl SearchDocumentsTool {
    pub fn new(engine: Arc<RetrievalEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl Tool for SearchDocumentsTool {
    fn name(&self) -> &str {
        "search_documents"
    }

    fn description(&self) -> &str {
        "Search the uploaded documents for passages relevant to a query"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "What to look for"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of passages",
                    "default": 5
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, parameters: Value) -> Result<Value, CairnError> {
        let query = parameters
            .get("query")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| CairnError::tool(self.name(), "missing required 'query' parameter"))?;
        let limit = limit_arg(&parameters, 5);

        let hits = self.engine.search(query, limit, None).await?;
        let results: Vec<Value> = hits
            .iter()
            .map(|h| {
                json!({
                    "document": h.document_name,
                    "text": h.text,
                    "score": h.score,
                })
            })
            .collect();
        Ok(json!({ "query": query, "results": results }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_config::UntaggedPolicy;
    use cairn_memory::{JsonVectorStore, Metadata, StoreOptions, VectorStore};
    use cairn_test_utils::MockEmbedder;

    async fn tool(dir: &tempfile::TempDir) -> SearchDocumentsTool {
        let store = Arc::new(JsonVectorStore::new(
            dir.path().join("v.json"),
            Arc::new(MockEmbedder::new(16)),
            StoreOptions {
                dimension: 16,
                untagged: UntaggedPolicy::Visible,
            },
        ));
        let chunks = vec![
            "tokio spawns tasks onto worker threads".to_string(),
            "sourdough needs a mature starter".to_string(),
        ];
        store.store(&chunks, "notes.md", &Metadata::new()).await.unwrap();
        SearchDocumentsTool::new(Arc::new(RetrievalEngine::new(store, None, 2, 5)))
    }

    #[tokio::test]
    async fn returns_ranked_passages() {
        let dir = tempfile::tempdir().unwrap();
        let out = tool(&dir)
            .await
            .execute(json!({"query": "tokio worker threads", "limit": 1}))
            .await
            .unwrap();
        let results = out["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["document"], "notes.md");
        assert!(results[0]["text"].as_str().unwrap().contains("tokio"));
    }

    #[tokio::test]
    async fn missing_query_is_tool_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = tool(&dir).await.execute(json!({"query": "  "})).await.unwrap_err();
        assert!(matches!(err, CairnError::ToolExecution { .. }));
    }
}
