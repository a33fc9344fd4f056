// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cross-handle behaviour of the file-backed stores.

use std::sync::Arc;

use cairn_core::types::ChatMessage;
use cairn_storage::{ConversationStore, ExportFormat};

#[tokio::test]
async fn concurrent_saves_through_separate_handles_are_all_kept() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conversations.json");

    let mut tasks = Vec::new();
    for i in 0..16 {
        // A fresh handle per task; the lock is keyed on the path, not the handle.
        let store = Arc::new(ConversationStore::new(&path));
        tasks.push(tokio::spawn(async move {
            store
                .save(
                    vec![
                        ChatMessage::user(format!("question {i}")),
                        ChatMessage::assistant(format!("answer {i}")),
                    ],
                    [format!("batch-{}", i % 2)],
                    Default::default(),
                )
                .await
                .unwrap()
        }));
    }
    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap());
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 16);

    let reader = ConversationStore::new(&path);
    assert_eq!(reader.load(&[], 100).await.len(), 16);
    assert_eq!(reader.load(&["batch-0".to_string()], 100).await.len(), 8);
    assert_eq!(reader.all_tags().await, vec!["batch-0", "batch-1"]);
}

#[tokio::test]
async fn saved_conversation_survives_reopen_and_exports() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conversations.json");

    let id = ConversationStore::new(&path)
        .save(
            vec![ChatMessage::user("How do cairns mark trails?"), ChatMessage::assistant("Stacked stones.")],
            ["hiking"],
            Default::default(),
        )
        .await
        .unwrap();

    let reopened = ConversationStore::new(&path);
    let conversation = reopened.get(&id).await.unwrap();
    assert_eq!(conversation.messages.len(), 2);

    let json = reopened.export(&id, ExportFormat::Json).await.unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["id"], id.as_str());
    assert!(reopened.export("missing", ExportFormat::Markdown).await.unwrap().is_none());
}
