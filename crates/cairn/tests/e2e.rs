// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests over a fully wired app with mock adapters.
//!
//! Each test gets its own temp directory for the database and JSON files.

use std::sync::Arc;

use cairn::doctor::{collect_checks, CheckStatus};
use cairn::{Adapters, App};
use cairn_agent::TurnOptions;
use cairn_config::CairnConfig;
use cairn_core::ToolHost;
use cairn_memory::Metadata;
use cairn_test_utils::{MockCompletion, MockEmbedder, MockToolHost};
use serde_json::json;

struct Setup {
    dir: tempfile::TempDir,
    completion: Arc<MockCompletion>,
    app: App,
}

fn config(dir: &tempfile::TempDir, sqlite: bool) -> CairnConfig {
    let mut config = CairnConfig::default();
    let path = |name: &str| dir.path().join(name).display().to_string();
    config.storage.database_path = sqlite.then(|| path("cairn.db"));
    config.storage.vector_json_path = path("vector_store.json");
    config.storage.conversations_path = path("conversations.json");
    config.chunking.chunk_size = 8;
    config.chunking.chunk_overlap = 2;
    config
}

async fn setup(sqlite: bool, tool_host: Option<Arc<dyn ToolHost>>) -> Setup {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir, sqlite);
    let completion = Arc::new(MockCompletion::new());
    let adapters = Adapters {
        embedder: Arc::new(MockEmbedder::new(config.embedding.dimension)),
        completion: completion.clone(),
        tool_host,
    };
    let app = App::with_adapters(config, adapters).await.unwrap();
    Setup {
        dir,
        completion,
        app,
    }
}

#[tokio::test]
async fn backend_follows_storage_config() {
    let sqlite = setup(true, None).await;
    assert_eq!(sqlite.app.store.backend(), "sqlite");

    let json = setup(false, None).await;
    assert_eq!(json.app.store.backend(), "json");
}

#[tokio::test]
async fn ingest_search_delete_on_both_backends() {
    for sqlite in [true, false] {
        let s = setup(sqlite, None).await;
        let file = s.dir.path().join("rivers.md");
        std::fs::write(
            &file,
            "Rivers carry sediment downstream. Deltas form where rivers meet the sea. \
             Floodplains are rich farmland.",
        )
        .unwrap();

        let mut metadata = Metadata::new();
        metadata.insert("category".to_string(), json!("geography"));
        let chunks = s.app.ingest_file(&file, None, None, &metadata).await.unwrap();
        assert!(chunks >= 2, "backend sqlite={sqlite}");

        let hits = s.app.retrieval.search("rivers delta sea", 3, None).await.unwrap();
        assert!(!hits.is_empty());
        assert!(hits.iter().all(|h| h.document_name == "rivers.md"));
        assert_eq!(hits[0].metadata["file_type"], "md");
        assert_eq!(hits[0].metadata["category"], "geography");

        let docs = s.app.store.list_documents().await.unwrap();
        assert_eq!(docs[0].name, "rivers.md");
        assert_eq!(docs[0].chunks, chunks);

        assert_eq!(s.app.store.delete("rivers.md").await.unwrap(), chunks);
        assert!(s.app.retrieval.search("rivers", 3, None).await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn unsupported_format_is_reported() {
    let s = setup(false, None).await;
    let file = s.dir.path().join("scan.pdf");
    std::fs::write(&file, b"%PDF-1.7").unwrap();
    let err = s
        .app
        .ingest_file(&file, None, None, &Metadata::new())
        .await
        .unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(s.app.store.stats().await.unwrap().total_chunks, 0);
}

#[tokio::test]
async fn chat_turn_then_save_and_recall() {
    let s = setup(true, None).await;
    s.completion.push_text("Cairns are stacked stones marking a trail.").await;

    let agent = s.app.agents.get("General Chat").unwrap();
    agent
        .run_turn("What is a cairn?", TurnOptions::default())
        .await
        .unwrap();
    let id = s
        .app
        .conversations
        .save(agent.history().await, ["trails"], Default::default())
        .await
        .unwrap();

    let found = s.app.conversations.load(&["trails".to_string()], 10).await;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, id);
    assert_eq!(found[0].title, "What is a cairn?");
}

#[tokio::test]
async fn doctor_reports_unreachable_tool_host() {
    let host: Arc<dyn ToolHost> = Arc::new(MockToolHost::unreachable());
    let s = setup(false, Some(host)).await;

    // Discovery failed, but every agent was still built.
    assert_eq!(s.app.agents.len(), 4);

    let checks = collect_checks(&s.app).await;
    let status = |name: &str| {
        checks
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.status.clone())
            .unwrap()
    };
    assert_eq!(status("Vector store"), CheckStatus::Pass);
    assert_eq!(status("Embedding"), CheckStatus::Pass);
    assert_eq!(status("Tool host"), CheckStatus::Fail);
}
