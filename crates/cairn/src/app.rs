// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Startup wiring shared by every command.

use std::path::Path;
use std::sync::Arc;

use cairn_agent::{AgentDeps, AgentRegistry};
use cairn_config::CairnConfig;
use cairn_core::types::DocumentFormat;
use cairn_core::{CairnError, CompletionAdapter, EmbeddingAdapter, ToolHost};
use cairn_memory::{
    ingest_document, open_vector_store, Metadata, PlainTextExtractor, RetrievalEngine, TextChunker,
    VectorStore,
};
use cairn_ollama::{OllamaCompletion, OllamaEmbedder};
use cairn_skill::HttpToolHost;
use cairn_storage::ConversationStore;
use tracing::info;

/// The external collaborators the app talks to.
pub struct Adapters {
    pub embedder: Arc<dyn EmbeddingAdapter>,
    pub completion: Arc<dyn CompletionAdapter>,
    pub tool_host: Option<Arc<dyn ToolHost>>,
}

impl Adapters {
    /// Ollama for embeddings and chat, plus the HTTP tool host when enabled.
    pub fn from_config(config: &CairnConfig) -> Result<Self, CairnError> {
        let tool_host: Option<Arc<dyn ToolHost>> = if config.tool_host.enabled {
            Some(Arc::new(HttpToolHost::from_config(&config.tool_host)?))
        } else {
            None
        };
        Ok(Self {
            embedder: Arc::new(OllamaEmbedder::new(config)?),
            completion: Arc::new(OllamaCompletion::new(config)?),
            tool_host,
        })
    }
}

/// A fully wired Cairn instance.
pub struct App {
    pub config: CairnConfig,
    pub adapters: Adapters,
    pub store: Arc<dyn VectorStore>,
    pub retrieval: Arc<RetrievalEngine>,
    pub conversations: Arc<ConversationStore>,
    pub agents: AgentRegistry,
}

impl App {
    pub async fn start(config: CairnConfig) -> Result<Self, CairnError> {
        let adapters = Adapters::from_config(&config)?;
        Self::with_adapters(config, adapters).await
    }

    /// Wire the stores and agents around the given adapters.
    pub async fn with_adapters(config: CairnConfig, adapters: Adapters) -> Result<Self, CairnError> {
        let store = open_vector_store(&config, adapters.embedder.clone()).await;
        let retrieval = Arc::new(RetrievalEngine::from_config(store.clone(), &config));
        let conversations = Arc::new(ConversationStore::new(&config.storage.conversations_path));

        let agents = AgentRegistry::build(
            &config,
            AgentDeps {
                completion: adapters.completion.clone(),
                retrieval: retrieval.clone(),
                conversations: conversations.clone(),
                tool_host: adapters.tool_host.clone(),
            },
        )
        .await?;

        info!(backend = store.backend(), agents = agents.len(), "cairn ready");
        Ok(Self {
            config,
            adapters,
            store,
            retrieval,
            conversations,
            agents,
        })
    }

    /// Read a file and store it as chunks. Returns the chunk count.
    ///
    /// The format comes from `format` when given, otherwise from the extension.
    pub async fn ingest_file(
        &self,
        path: &Path,
        name: Option<&str>,
        format: Option<&str>,
        metadata: &Metadata,
    ) -> Result<usize, CairnError> {
        let bytes = tokio::fs::read(path).await.map_err(CairnError::storage)?;
        let document_name = match name {
            Some(n) => n.to_string(),
            None => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
        };
        let format = format.map_or_else(|| DocumentFormat::from_path(path), DocumentFormat::parse);

        ingest_document(
            self.store.as_ref(),
            &PlainTextExtractor,
            &TextChunker::from_config(&self.config),
            &bytes,
            &document_name,
            &format,
            metadata,
        )
        .await
    }
}
