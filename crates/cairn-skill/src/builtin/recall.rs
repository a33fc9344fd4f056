// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation recall tool.

use std::sync::Arc;

use async_trait::async_trait;
use cairn_core::CairnError;
use cairn_storage::{Conversation, ConversationStore};
use serde_json::{json, Value};

use super::limit_arg;
use crate::tool::Tool;

/// Longest message excerpt returned per match.
const EXCERPT_CHARS: usize = 300;

/// Searches saved conversations by keyword, or lists the latest ones.
pub struct RecallConversationTool {
    store: Arc<ConversationStore>,
}

impl RecallConversationTool {
    pub fn new(store: Arc<ConversationStore>) -> Self {
        Self { store }
    }
}

fn excerpt(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

fn summarize(conversation: &Conversation, query: Option<&str>) -> Value {
    let needle = query.map(str::to_lowercase);
    let excerpts: Vec<Value> = conversation
        .messages
        .iter()
        .filter(|m| match &needle {
            Some(n) => m.content.to_lowercase().contains(n.as_str()),
            None => true,
        })
        .take(3)
        .map(|m| json!({ "role": m.role.to_string(), "content": excerpt(&m.content) }))
        .collect();
    json!({
        "id": conversation.id,
        "title": conversation.title,
        "created_at": conversation.created_at.to_rfc3339(),
        "tags": conversation.tags,
        "excerpts": excerpts,
    })
}

#[async_trait]
impl Tool for RecallConversationTool {
    fn name(&self) -> &str {
        "recall_conversation"
    }

    fn description(&self) -> &str {
        "Recall earlier saved conversations, optionally filtered by a keyword"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Keyword to look for; omit for the most recent conversations"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of conversations",
                    "default": 5
                }
            }
        })
    }

    async fn execute(&self, parameters: Value) -> Result<Value, CairnError> {
        let limit = limit_arg(&parameters, 5);
        let query = parameters
            .get("query")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|q| !q.is_empty());

        let conversations = match query {
            Some(q) => {
                let mut found = self.store.search(q).await;
                found.truncate(limit);
                found
            }
            None => self.store.load(&[], limit).await,
        };
        let items: Vec<Value> = conversations.iter().map(|c| summarize(c, query)).collect();
        Ok(json!({ "count": items.len(), "conversations": items }))
    }
}
