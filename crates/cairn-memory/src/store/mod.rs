// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vector store interface and its two backends.
//!
//! [`SqliteVectorStore`] scores chunks with sqlite-vec inside the database;
//! [`JsonVectorStore`] keeps chunks in one JSON file and scans them in
//! memory. [`open_vector_store`] picks one per process with a connectivity
//! probe and never revisits the choice.

mod json;
mod sqlite;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use cairn_config::{CairnConfig, UntaggedPolicy};
use cairn_core::{CairnError, EmbeddingAdapter};
use cairn_storage::Database;
use tracing::{info, warn};

use crate::types::{DocumentSummary, Metadata, MetadataFilter, SearchHit, StoreStats};

pub use json::JsonVectorStore;
pub use sqlite::SqliteVectorStore;

/// Durable chunk persistence with nearest-neighbour lookup.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Short backend label for logs.
    fn backend(&self) -> &'static str;

    /// Embed and persist each chunk of `document_name` in order.
    ///
    /// Chunks are written one at a time: if embedding fails partway, the
    /// chunks before it stay stored. A vector whose length differs from the
    /// configured dimension aborts with [`CairnError::EmbeddingDimension`].
    async fn store(
        &self,
        chunks: &[String],
        document_name: &str,
        metadata: &Metadata,
    ) -> Result<(), CairnError>;

    /// At most `limit` chunks by descending cosine similarity to `query`.
    ///
    /// Equal scores keep insertion order. An empty store yields an empty result.
    async fn search(
        &self,
        query: &str,
        limit: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SearchHit>, CairnError>;

    /// Remove every chunk of `document_name`; returns the number removed.
    async fn delete(&self, document_name: &str) -> Result<usize, CairnError>;

    async fn stats(&self) -> Result<StoreStats, CairnError>;

    /// Documents with their chunk counts, most recently uploaded first.
    async fn list_documents(&self) -> Result<Vec<DocumentSummary>, CairnError>;
}

/// Settings shared by both backends.
#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
    /// Required length of every embedding.
    pub dimension: usize,
    pub untagged: UntaggedPolicy,
}

impl StoreOptions {
    pub fn from_config(config: &CairnConfig) -> Self {
        Self {
            dimension: config.embedding.dimension,
            untagged: config.retrieval.untagged,
        }
    }
}

/// Embedding adapter wrapper enforcing the configured dimension.
#[derive(Clone)]
pub(crate) struct CheckedEmbedder {
    inner: Arc<dyn EmbeddingAdapter>,
    dimension: usize,
}

impl CheckedEmbedder {
    pub(crate) fn new(inner: Arc<dyn EmbeddingAdapter>, dimension: usize) -> Self {
        Self { inner, dimension }
    }

    /// Blank text maps to the zero vector without calling the provider;
    /// providers answer it with an empty embedding.
    pub(crate) async fn embed(&self, text: &str) -> Result<Vec<f32>, CairnError> {
        if text.trim().is_empty() {
            return Ok(vec![0.0; self.dimension]);
        }
        let vector = self.inner.embed_text(text).await?;
        if vector.len() != self.dimension {
            return Err(CairnError::EmbeddingDimension {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(vector)
    }
}

/// Choose the backend for this process.
///
/// The relational backend is tried first: open the database, run migrations
/// and call a sqlite-vec function. Any failure, or no configured database
/// path, selects the JSON file backend for the rest of the process.
pub async fn open_vector_store(
    config: &CairnConfig,
    embedder: Arc<dyn EmbeddingAdapter>,
) -> Arc<dyn VectorStore> {
    let options = StoreOptions::from_config(config);

    if let Some(path) = config.storage.relational_path() {
        match probe_database(path, config.storage.wal_mode).await {
            Ok(db) => {
                info!(path, "using sqlite vector backend");
                return Arc::new(SqliteVectorStore::new(db, embedder, options));
            }
            Err(e) => {
                warn!(
                    error = %e,
                    path,
                    fallback = %config.storage.vector_json_path,
                    "relational vector backend unavailable, using JSON file backend"
                );
            }
        }
    }

    let path = Path::new(&config.storage.vector_json_path);
    info!(path = %path.display(), "using JSON file vector backend");
    Arc::new(JsonVectorStore::new(path, embedder, options))
}

async fn probe_database(path: &str, wal_mode: bool) -> Result<Database, CairnError> {
    let db = Database::open(path, wal_mode).await?;
    db.probe().await?;
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_test_utils::MockEmbedder;

    #[tokio::test]
    async fn probe_success_selects_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = CairnConfig::default();
        config.storage.database_path = Some(dir.path().join("cairn.db").display().to_string());
        config.storage.vector_json_path = dir.path().join("vectors.json").display().to_string();

        let store = open_vector_store(&config, Arc::new(MockEmbedder::new(8))).await;
        assert_eq!(store.backend(), "sqlite");
    }

    #[tokio::test]
    async fn unopenable_database_falls_back_to_json() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened as a database file.
        let mut config = CairnConfig::default();
        config.storage.database_path = Some(dir.path().display().to_string());
        config.storage.vector_json_path = dir.path().join("vectors.json").display().to_string();

        let store = open_vector_store(&config, Arc::new(MockEmbedder::new(8))).await;
        assert_eq!(store.backend(), "json");
    }

    #[tokio::test]
    async fn blank_text_embeds_as_zero_vector_without_provider_call() {
        let provider = Arc::new(
            MockEmbedder::new(4)
                .with_vector("", Vec::new())
                .with_vector("   ", Vec::new()),
        );
        let checked = CheckedEmbedder::new(provider.clone(), 4);

        assert_eq!(checked.embed("").await.unwrap(), vec![0.0; 4]);
        assert_eq!(checked.embed(" \n\t").await.unwrap(), vec![0.0; 4]);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn empty_chunks_store_and_score_zero_on_both_backends() {
        let dir = tempfile::tempdir().unwrap();
        // Real providers answer blank prompts with an empty embedding.
        let provider = || {
            Arc::new(
                MockEmbedder::new(4)
                    .with_vector("", Vec::new())
                    .with_vector("hello", vec![1.0, 0.0, 0.0, 0.0]),
            )
        };
        let options = StoreOptions {
            dimension: 4,
            untagged: UntaggedPolicy::Visible,
        };
        let db = Database::open_in_memory().await.unwrap();
        let stores: Vec<Box<dyn VectorStore>> = vec![
            Box::new(JsonVectorStore::new(dir.path().join("vectors.json"), provider(), options)),
            Box::new(SqliteVectorStore::new(db, provider(), options)),
        ];

        for store in stores {
            let chunks = vec!["hello".to_string(), String::new()];
            store.store(&chunks, "doc", &Metadata::new()).await.unwrap();
            assert_eq!(store.stats().await.unwrap().total_chunks, 2, "{}", store.backend());

            let hits = store.search("hello", 5, None).await.unwrap();
            assert_eq!(hits[0].text, "hello");
            assert_eq!(hits[1].score, 0.0);

            let blank = store.search("", 5, None).await.unwrap();
            assert_eq!(blank.len(), 2);
            assert!(blank.iter().all(|h| h.score == 0.0));
        }
    }

    #[tokio::test]
    async fn missing_database_path_uses_json() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = CairnConfig::default();
        config.storage.database_path = None;
        config.storage.vector_json_path = dir.path().join("vectors.json").display().to_string();

        let store = open_vector_store(&config, Arc::new(MockEmbedder::new(8))).await;
        assert_eq!(store.backend(), "json");
    }
}
