// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only conversation log with tag and keyword retrieval.
//!
//! Records live in one JSON file in creation order. `save` only ever appends;
//! `load` and `search` walk the file newest-first. Read failures degrade to an
//! empty result with a warning, while write failures are returned.

use std::collections::BTreeSet;
use std::path::PathBuf;

use cairn_core::{CairnError, ChatMessage, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{info, warn};

use crate::json_file::JsonFile;

const TITLE_MAX_CHARS: usize = 50;

/// A saved conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub messages: Vec<ChatMessage>,
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    fn has_any_tag(&self, wanted: &[String]) -> bool {
        wanted.iter().any(|tag| self.tags.contains(tag))
    }

    fn mentions(&self, needle_lower: &str) -> bool {
        self.messages
            .iter()
            .any(|m| m.content.to_lowercase().contains(needle_lower))
    }
}

/// Output formats for [`ConversationStore::export`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ExportFormat {
    Json,
    #[strum(serialize = "markdown", serialize = "md")]
    Markdown,
    #[strum(serialize = "text", serialize = "txt")]
    Text,
}

/// Persisted conversation log shared by every agent.
pub struct ConversationStore {
    file: JsonFile<Conversation>,
}

impl ConversationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonFile::new(path),
        }
    }

    /// Append a new conversation record and return its id.
    ///
    /// The record is on disk before this returns.
    pub async fn save(
        &self,
        messages: Vec<ChatMessage>,
        tags: impl IntoIterator<Item = impl Into<String>>,
        metadata: serde_json::Map<String, serde_json::Value>,
    ) -> Result<String, CairnError> {
        let tags: BTreeSet<String> = tags
            .into_iter()
            .map(|t| {
                let t: String = t.into();
                t.trim().to_string()
            })
            .filter(|t| !t.is_empty())
            .collect();

        let conversation = Conversation {
            id: uuid::Uuid::new_v4().simple().to_string(),
            title: derive_title(&messages),
            messages,
            tags,
            metadata,
            created_at: Utc::now(),
        };
        let id = conversation.id.clone();
        let message_count = conversation.messages.len();
        let tag_count = conversation.tags.len();

        self.file.update(move |records| records.push(conversation)).await?;

        info!(conversation_id = %id, messages = message_count, tags = tag_count, "conversation saved");
        Ok(id)
    }

    /// Conversations newest-first, optionally restricted to those carrying any of `filter_tags`.
    pub async fn load(&self, filter_tags: &[String], limit: usize) -> Vec<Conversation> {
        self.records()
            .await
            .into_iter()
            .rev()
            .filter(|c| filter_tags.is_empty() || c.has_any_tag(filter_tags))
            .take(limit)
            .collect()
    }

    /// Conversations whose message content contains `keyword`, ignoring case, newest-first.
    pub async fn search(&self, keyword: &str) -> Vec<Conversation> {
        let needle = keyword.to_lowercase();
        self.records()
            .await
            .into_iter()
            .rev()
            .filter(|c| c.mentions(&needle))
            .collect()
    }

    pub async fn get(&self, id: &str) -> Option<Conversation> {
        self.records().await.into_iter().find(|c| c.id == id)
    }

    /// Every tag in use, sorted and deduplicated.
    pub async fn all_tags(&self) -> Vec<String> {
        self.records()
            .await
            .into_iter()
            .flat_map(|c| c.tags)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Render one conversation; `Ok(None)` when the id is unknown.
    pub async fn export(&self, id: &str, format: ExportFormat) -> Result<Option<String>, CairnError> {
        let Some(conversation) = self.get(id).await else {
            return Ok(None);
        };
        let rendered = match format {
            ExportFormat::Json => serde_json::to_string_pretty(&conversation)
                .map_err(|e| CairnError::Internal(format!("conversation export failed: {e}")))?,
            ExportFormat::Markdown => render_markdown(&conversation),
            ExportFormat::Text => render_text(&conversation),
        };
        Ok(Some(rendered))
    }

    /// Remove a conversation. Returns whether a record was removed.
    ///
    /// This is the only operation that removes records.
    pub async fn delete(&self, id: &str) -> Result<bool, CairnError> {
        let id = id.to_string();
        let removed = self
            .file
            .update(|records| {
                let before = records.len();
                records.retain(|c| c.id != id);
                before != records.len()
            })
            .await?;
        if removed {
            info!(conversation_id = %id, "conversation deleted");
        }
        Ok(removed)
    }

    async fn records(&self) -> Vec<Conversation> {
        match self.file.read_all().await {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    error = %e,
                    path = %self.file.path().display(),
                    "conversation log unreadable, returning no conversations"
                );
                Vec::new()
            }
        }
    }
}

fn derive_title(messages: &[ChatMessage]) -> String {
    let Some(first) = messages.iter().find(|m| m.role == Role::User) else {
        return "Untitled conversation".to_string();
    };
    let text = first.content.trim();
    if text.chars().count() > TITLE_MAX_CHARS {
        let cut: String = text.chars().take(TITLE_MAX_CHARS).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

fn tag_line(conversation: &Conversation) -> String {
    conversation
        .tags
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_markdown(conversation: &Conversation) -> String {
    let mut out = format!(
        "# {}\n\n*Created: {}*\n\n",
        conversation.title,
        conversation.created_at.to_rfc3339()
    );
    if !conversation.tags.is_empty() {
        out.push_str(&format!("*Tags: {}*\n\n", tag_line(conversation)));
    }
    out.push_str("---\n\n");
    for message in &conversation.messages {
        let heading = match message.role {
            Role::User => "User".to_string(),
            Role::Assistant => "Assistant".to_string(),
            Role::System => "System".to_string(),
            Role::Tool => format!("Tool ({})", message.name.as_deref().unwrap_or("unknown")),
        };
        out.push_str(&format!("### {heading}\n\n{}\n\n", message.content));
    }
    out
}

fn render_text(conversation: &Conversation) -> String {
    let mut out = format!(
        "{}\nCreated: {}\n",
        conversation.title,
        conversation.created_at.to_rfc3339()
    );
    if !conversation.tags.is_empty() {
        out.push_str(&format!("Tags: {}\n", tag_line(conversation)));
    }
    out.push_str(&"=".repeat(50));
    out.push_str("\n\n");
    for message in &conversation.messages {
        out.push_str(&format!(
            "{}:\n{}\n\n",
            message.role.to_string().to_uppercase(),
            message.content
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use tracing_test::traced_test;

    fn exchange(question: &str, answer: &str) -> Vec<ChatMessage> {
        vec![ChatMessage::user(question), ChatMessage::assistant(answer)]
    }

    fn store() -> (tempfile::TempDir, ConversationStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ConversationStore::new(dir.path().join("conversations.json"));
        (dir, store)
    }

    #[tokio::test]
    async fn load_by_tag_matches_exactly_the_tagged_conversation() {
        let (_dir, store) = store();
        store
            .save(exchange("write a sort", "here"), ["Coder"], Default::default())
            .await
            .unwrap();

        assert_eq!(store.load(&["Coder".to_string()], 10).await.len(), 1);
        assert!(store.load(&["General Chat".to_string()], 10).await.is_empty());
    }

    #[tokio::test]
    async fn tag_filter_is_inclusive_or() {
        let (_dir, store) = store();
        store.save(exchange("one", "1"), ["A", "B"], Default::default()).await.unwrap();
        store.save(exchange("two", "2"), ["B"], Default::default()).await.unwrap();

        let loaded = store.load(&["A".to_string()], 10).await;
        assert_eq!(loaded.len(), 1);
        assert!(loaded[0].tags.contains("B"));

        let either = store.load(&["A".to_string(), "B".to_string()], 10).await;
        assert_eq!(either.len(), 2);
    }

    #[tokio::test]
    async fn load_is_most_recent_first_and_bounded() {
        let (_dir, store) = store();
        for i in 0..5 {
            store
                .save(exchange(&format!("question {i}"), "a"), Vec::<String>::new(), Default::default())
                .await
                .unwrap();
        }

        let loaded = store.load(&[], 3).await;
        let titles: Vec<_> = loaded.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["question 4", "question 3", "question 2"]);
    }

    #[tokio::test]
    async fn search_is_case_insensitive_over_content() {
        let (_dir, store) = store();
        store.save(exchange("Tell me about Rust", "It is fast"), ["x"], Default::default()).await.unwrap();
        store.save(exchange("Weather?", "Sunny"), ["x"], Default::default()).await.unwrap();

        let hits = store.search("rUsT").await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Tell me about Rust");
        assert_eq!(store.search("sunny").await.len(), 1);
        assert!(store.search("python").await.is_empty());
    }

    #[tokio::test]
    async fn reads_do_not_mutate_the_log() {
        let (dir, store) = store();
        store.save(exchange("q", "a"), ["t"], Default::default()).await.unwrap();
        let path = dir.path().join("conversations.json");
        let before = std::fs::read(&path).unwrap();

        store.load(&[], 10).await;
        store.search("q").await;
        store.all_tags().await;

        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn title_is_truncated_first_user_message() {
        let (_dir, store) = store();
        let long = "x".repeat(80);
        let id = store
            .save(vec![ChatMessage::system("sys"), ChatMessage::user(&long)], ["t"], Default::default())
            .await
            .unwrap();
        let saved = store.get(&id).await.unwrap();
        assert_eq!(saved.title, format!("{}...", "x".repeat(50)));
    }

    #[tokio::test]
    async fn all_tags_sorted_unique() {
        let (_dir, store) = store();
        store.save(exchange("a", "b"), ["zeta", "alpha"], Default::default()).await.unwrap();
        store.save(exchange("c", "d"), ["alpha", " ", "mid"], Default::default()).await.unwrap();
        assert_eq!(store.all_tags().await, vec!["alpha", "mid", "zeta"]);
    }

    #[tokio::test]
    async fn export_formats() {
        let (_dir, store) = store();
        let id = store
            .save(exchange("What is 2+2?", "4"), ["math"], Default::default())
            .await
            .unwrap();

        let md = store.export(&id, ExportFormat::Markdown).await.unwrap().unwrap();
        assert!(md.starts_with("# What is 2+2?"));
        assert!(md.contains("### Assistant\n\n4"));
        assert!(md.contains("*Tags: math*"));

        let text = store.export(&id, ExportFormat::Text).await.unwrap().unwrap();
        assert!(text.contains("USER:\nWhat is 2+2?"));

        let json = store.export(&id, ExportFormat::Json).await.unwrap().unwrap();
        let parsed: Conversation = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, id);

        assert!(store.export("missing", ExportFormat::Json).await.unwrap().is_none());
        assert_eq!(ExportFormat::from_str("MD").unwrap(), ExportFormat::Markdown);
    }

    #[tokio::test]
    async fn delete_is_explicit_and_targeted() {
        let (_dir, store) = store();
        let keep = store.save(exchange("keep", "k"), ["t"], Default::default()).await.unwrap();
        let drop_id = store.save(exchange("drop", "d"), ["t"], Default::default()).await.unwrap();

        assert!(store.delete(&drop_id).await.unwrap());
        assert!(!store.delete(&drop_id).await.unwrap());
        let remaining = store.load(&[], 10).await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, keep);
    }

    #[tokio::test]
    #[traced_test]
    async fn corrupt_log_degrades_to_empty_and_logs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conversations.json");
        std::fs::write(&path, "[{\"broken\":").unwrap();
        let store = ConversationStore::new(&path);

        assert!(store.load(&[], 10).await.is_empty());
        assert!(store.search("x").await.is_empty());
        assert!(logs_contain("conversation log unreadable"));

        let write = store.save(exchange("q", "a"), ["t"], Default::default()).await;
        assert!(matches!(write, Err(CairnError::Storage { .. })));
    }
}
