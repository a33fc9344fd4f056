// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON file backend: every chunk in one array, searched by linear scan.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use cairn_core::{CairnError, EmbeddingAdapter};
use cairn_storage::JsonFile;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::{CheckedEmbedder, StoreOptions, VectorStore};
use crate::types::{
    chunk_metadata, cosine_similarity, metadata_matches, ChunkRecord, DocumentSummary, Metadata,
    MetadataFilter, SearchHit, StoreStats, KEY_UPLOADED_AT,
};

pub struct JsonVectorStore {
    file: JsonFile<ChunkRecord>,
    embedder: CheckedEmbedder,
    options: StoreOptions,
}

impl JsonVectorStore {
    pub fn new(
        path: impl Into<PathBuf>,
        embedder: Arc<dyn EmbeddingAdapter>,
        options: StoreOptions,
    ) -> Self {
        Self {
            file: JsonFile::new(path),
            embedder: CheckedEmbedder::new(embedder, options.dimension),
            options,
        }
    }
}

fn uploaded_at(record: &ChunkRecord) -> Option<DateTime<Utc>> {
    record
        .metadata
        .get(KEY_UPLOADED_AT)
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc))
}

#[async_trait]
impl VectorStore for JsonVectorStore {
    fn backend(&self) -> &'static str {
        "json"
    }

    async fn store(
        &self,
        chunks: &[String],
        document_name: &str,
        metadata: &Metadata,
    ) -> Result<(), CairnError> {
        let stamp = Utc::now().to_rfc3339();
        for (index, text) in chunks.iter().enumerate() {
            let embedding = self.embedder.embed(text).await?;
            let record = ChunkRecord {
                id: uuid::Uuid::new_v4().simple().to_string(),
                document_name: document_name.to_string(),
                chunk_text: text.clone(),
                embedding,
                metadata: chunk_metadata(metadata, index, chunks.len(), &stamp),
            };
            let id = record.id.clone();
            self.file.update(move |records| records.push(record)).await?;
            debug!(document = document_name, chunk = index, id = %id, "chunk stored");
        }
        info!(backend = "json", document = document_name, chunks = chunks.len(), "document stored");
        Ok(())
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SearchHit>, CairnError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let query_vec = self.embedder.embed(query).await?;
        let records = self.file.read_all().await?;

        let mut scored: Vec<(f32, ChunkRecord)> = records
            .into_iter()
            .filter(|r| {
                filter.is_none_or(|f| metadata_matches(&r.metadata, f, self.options.untagged))
            })
            .map(|r| (cosine_similarity(&query_vec, &r.embedding), r))
            .collect();
        // Stable: equal scores stay in file (insertion) order.
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(limit);

        Ok(scored
            .into_iter()
            .map(|(score, r)| SearchHit {
                chunk_id: r.id,
                document_name: r.document_name,
                text: r.chunk_text,
                metadata: r.metadata,
                score,
            })
            .collect())
    }

    async fn delete(&self, document_name: &str) -> Result<usize, CairnError> {
        let removed = self
            .file
            .update(|records| {
                let before = records.len();
                records.retain(|r| r.document_name != document_name);
                before - records.len()
            })
            .await?;
        info!(backend = "json", document = document_name, removed, "document deleted");
        Ok(removed)
    }

    async fn stats(&self) -> Result<StoreStats, CairnError> {
        let records = self.file.read_all().await?;
        let documents: std::collections::HashSet<&str> =
            records.iter().map(|r| r.document_name.as_str()).collect();
        Ok(StoreStats {
            total_chunks: records.len(),
            total_documents: documents.len(),
        })
    }

    async fn list_documents(&self) -> Result<Vec<DocumentSummary>, CairnError> {
        let records = self.file.read_all().await?;
        let mut by_name: HashMap<String, DocumentSummary> = HashMap::new();
        for record in &records {
            let when = uploaded_at(record);
            let entry = by_name
                .entry(record.document_name.clone())
                .or_insert_with(|| DocumentSummary {
                    name: record.document_name.clone(),
                    chunks: 0,
                    last_updated: None,
                });
            entry.chunks += 1;
            entry.last_updated = entry.last_updated.max(when);
        }
        let mut docs: Vec<_> = by_name.into_values().collect();
        docs.sort_by(|a, b| b.last_updated.cmp(&a.last_updated).then_with(|| a.name.cmp(&b.name)));
        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_config::UntaggedPolicy;
    use cairn_test_utils::MockEmbedder;
    use serde_json::json;

    const DIM: usize = 3;

    fn embedder() -> MockEmbedder {
        MockEmbedder::new(DIM)
            .with_vector("x", vec![1.0, 0.0, 0.0])
            .with_vector("y", vec![0.0, 1.0, 0.0])
            .with_vector("xy", vec![0.7, 0.7, 0.0])
            .with_vector("zero", vec![0.0, 0.0, 0.0])
    }

    fn open(dir: &tempfile::TempDir, untagged: UntaggedPolicy) -> JsonVectorStore {
        JsonVectorStore::new(
            dir.path().join("vectors.json"),
            Arc::new(embedder()),
            StoreOptions {
                dimension: DIM,
                untagged,
            },
        )
    }

    fn chunks(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[tokio::test]
    async fn missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir, UntaggedPolicy::Visible);
        assert!(store.search("x", 5, None).await.unwrap().is_empty());
        assert_eq!(store.stats().await.unwrap(), StoreStats::default());
    }

    #[tokio::test]
    async fn search_orders_by_similarity_and_limits() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir, UntaggedPolicy::Visible);
        store
            .store(&chunks(&["y", "xy", "x"]), "doc", &Metadata::new())
            .await
            .unwrap();

        let hits = store.search("x", 2, None).await.unwrap();
        let texts: Vec<_> = hits.iter().map(|h| h.text.as_str()).collect();
        assert_eq!(texts, vec!["x", "xy"]);
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn ties_keep_insertion_order_and_zero_vectors_score_zero() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir, UntaggedPolicy::Visible);
        store.store(&chunks(&["zero"]), "a", &Metadata::new()).await.unwrap();
        store.store(&chunks(&["x"]), "b", &Metadata::new()).await.unwrap();
        store.store(&chunks(&["x"]), "c", &Metadata::new()).await.unwrap();

        let hits = store.search("x", 3, None).await.unwrap();
        let docs: Vec<_> = hits.iter().map(|h| h.document_name.as_str()).collect();
        assert_eq!(docs, vec!["b", "c", "a"]);
        assert_eq!(hits[2].score, 0.0);
    }

    #[tokio::test]
    async fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        open(&dir, UntaggedPolicy::Visible)
            .store(&chunks(&["x", "y"]), "persisted", &Metadata::new())
            .await
            .unwrap();

        let reopened = open(&dir, UntaggedPolicy::Visible);
        let docs = reopened.list_documents().await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].name, "persisted");
        assert_eq!(docs[0].chunks, 2);
        assert!(docs[0].last_updated.is_some());
    }

    #[tokio::test]
    async fn delete_reports_removed_count() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir, UntaggedPolicy::Visible);
        store.store(&chunks(&["x", "y"]), "one", &Metadata::new()).await.unwrap();
        store.store(&chunks(&["xy"]), "two", &Metadata::new()).await.unwrap();

        assert_eq!(store.delete("one").await.unwrap(), 2);
        assert_eq!(store.delete("one").await.unwrap(), 0);
        assert_eq!(
            store.stats().await.unwrap(),
            StoreStats {
                total_chunks: 1,
                total_documents: 1
            }
        );
    }

    #[tokio::test]
    async fn isolated_policy_hides_untagged_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir, UntaggedPolicy::Isolated);
        let tagged = json!({"agent": "Coder"}).as_object().cloned().unwrap();
        store.store(&chunks(&["x"]), "tagged", &tagged).await.unwrap();
        store.store(&chunks(&["x"]), "untagged", &Metadata::new()).await.unwrap();

        let filter = MetadataFilter::from([("agent".to_string(), "Coder".to_string())]);
        let hits = store.search("x", 5, Some(&filter)).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document_name, "tagged");

        assert_eq!(store.search("x", 5, None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn wrong_dimension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonVectorStore::new(
            dir.path().join("vectors.json"),
            Arc::new(MockEmbedder::new(5)),
            StoreOptions {
                dimension: DIM,
                untagged: UntaggedPolicy::Visible,
            },
        );
        let err = store.store(&chunks(&["x"]), "d", &Metadata::new()).await.unwrap_err();
        assert!(matches!(err, CairnError::EmbeddingDimension { expected: 3, actual: 5 }));
        assert_eq!(store.stats().await.unwrap().total_chunks, 0);
    }
}
