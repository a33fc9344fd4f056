// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end agent turns over the JSON vector store and mock providers.

use std::sync::Arc;

use cairn_agent::{AgentDeps, AgentRegistry, TurnOptions};
use cairn_config::{CairnConfig, UntaggedPolicy};
use cairn_core::types::{DocumentFormat, Role};
use cairn_core::{CairnError, ToolHost};
use cairn_memory::{
    ingest_document, JsonVectorStore, Metadata, PlainTextExtractor, RetrievalEngine, StoreOptions,
    TextChunker,
};
use cairn_storage::ConversationStore;
use cairn_test_utils::{MockCompletion, MockEmbedder, MockToolHost};
use serde_json::json;

struct Harness {
    _dir: tempfile::TempDir,
    completion: Arc<MockCompletion>,
    store: Arc<JsonVectorStore>,
    conversations: Arc<ConversationStore>,
    registry: AgentRegistry,
}

async fn harness(tool_host: Option<Arc<dyn ToolHost>>) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let completion = Arc::new(MockCompletion::new());
    let store = Arc::new(JsonVectorStore::new(
        dir.path().join("vectors.json"),
        Arc::new(MockEmbedder::new(32)),
        StoreOptions {
            dimension: 32,
            untagged: UntaggedPolicy::Visible,
        },
    ));
    let conversations = Arc::new(ConversationStore::new(dir.path().join("conversations.json")));
    let config = CairnConfig::default();
    let registry = AgentRegistry::build(
        &config,
        AgentDeps {
            completion: completion.clone(),
            retrieval: Arc::new(RetrievalEngine::from_config(store.clone(), &config)),
            conversations: conversations.clone(),
            tool_host,
        },
    )
    .await
    .unwrap();
    Harness {
        _dir: dir,
        completion,
        store,
        conversations,
        registry,
    }
}

#[tokio::test]
async fn rag_agent_searches_documents_through_tool() {
    let h = harness(None).await;
    ingest_document(
        h.store.as_ref(),
        &PlainTextExtractor,
        &TextChunker::default(),
        b"The lighthouse keeper logs the tide every morning.",
        "keeper.txt",
        &DocumentFormat::PlainText,
        &Metadata::new(),
    )
    .await
    .unwrap();

    h.completion
        .push_tool_call("search_documents", json!({"query": "tide log"}))
        .await;
    h.completion
        .push_text("The keeper logs the tide every morning (keeper.txt).")
        .await;

    let agent = h.registry.get("RAG Assistant").unwrap();
    let reply = agent
        .run_turn("who logs the tide?", TurnOptions::default())
        .await
        .unwrap();

    assert_eq!(reply.retrieved.len(), 1);
    assert_eq!(reply.tool_results.len(), 1);
    let payload = &reply.tool_results[0].payload;
    assert_eq!(payload["results"][0]["document"], "keeper.txt");
    assert!(reply.message.contains("keeper.txt"));

    let first = &h.completion.requests().await[0];
    assert!(first.system_prompt.contains("Relevant documents:"));
    assert_eq!(first.tools.len(), 2);
}

#[tokio::test]
async fn recall_tool_reads_saved_conversations() {
    let h = harness(None).await;
    let general = h.registry.get("General Chat").unwrap();
    h.completion.push_text("Paris is the capital of France.").await;
    general
        .run_turn("capital of France?", TurnOptions::default())
        .await
        .unwrap();
    h.conversations
        .save(general.history().await, ["geography"], Default::default())
        .await
        .unwrap();

    h.completion
        .push_tool_call("recall_conversation", json!({"query": "France"}))
        .await;
    h.completion.push_text("We talked about Paris.").await;
    let reply = h
        .registry
        .get("RAG Assistant")
        .unwrap()
        .run_turn(
            "what did we discuss?",
            TurnOptions {
                retrieval: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(reply.tool_results[0].success);
    assert_eq!(reply.tool_results[0].payload["count"], 1);
    assert_eq!(reply.message, "We talked about Paris.");
}

#[tokio::test]
async fn failing_hosted_tool_still_produces_reply() {
    let host: Arc<dyn ToolHost> = Arc::new(
        MockToolHost::new()
            .with_tool("web_search", "Search the web")
            .with_outcome(
                "web_search",
                cairn_core::types::HostedCallOutcome {
                    success: false,
                    data: None,
                    error: Some("quota exceeded".to_string()),
                },
            ),
    );
    let h = harness(Some(host)).await;
    h.completion
        .push_tool_call("web_search", json!({"query": "news"}))
        .await;
    h.completion.push_text("").await;

    let agent = h.registry.get("Research Assistant").unwrap();
    assert!(agent.tool_names().contains(&"web_search"));
    let reply = agent
        .run_turn("latest news", TurnOptions::default())
        .await
        .unwrap();

    assert_eq!(reply.tool_results[0].payload, json!({"error": "quota exceeded"}));
    assert!(!reply.message.is_empty());
    let roles: Vec<Role> = agent.history().await.iter().map(|m| m.role).collect();
    assert_eq!(roles.last(), Some(&Role::Assistant));
}

#[tokio::test]
async fn agents_keep_separate_histories() {
    let h = harness(None).await;
    let coder = h.registry.get("Coder").unwrap();
    let general = h.registry.get("General Chat").unwrap();

    coder.run_turn("hello coder", TurnOptions::default()).await.unwrap();
    assert_eq!(coder.history().await.len(), 2);
    assert!(general.history().await.is_empty());

    let again = h.registry.get("Coder").unwrap();
    assert_eq!(again.history().await.len(), 2);
}

#[tokio::test]
async fn unknown_agent_reports_configuration_error() {
    let h = harness(None).await;
    let err = h.registry.get("Nonexistent").unwrap_err();
    assert!(err.is_configuration());
    assert!(matches!(err, CairnError::AgentNotFound { .. }));
}
