// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Relational backend: chunks in SQLite, similarity via sqlite-vec.

use std::sync::Arc;

use async_trait::async_trait;
use cairn_core::{CairnError, EmbeddingAdapter};
use cairn_storage::{map_tr_err, Database};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::{CheckedEmbedder, StoreOptions, VectorStore};
use crate::types::{
    chunk_metadata, l2_norm, metadata_matches, vec_to_blob, DocumentSummary, Metadata,
    MetadataFilter, SearchHit, StoreStats,
};

/// Zero-norm rows (and zero-norm queries) score exactly 0.0 without reaching
/// `vec_distance_cosine`. Ties fall back to rowid, i.e. insertion order.
const SEARCH_SQL: &str = "SELECT id, document_name, chunk_text, metadata, \
     CASE WHEN norm = 0.0 OR ?2 = 0.0 THEN 0.0 \
          ELSE 1.0 - vec_distance_cosine(embedding, ?1) END AS similarity \
     FROM document_chunks \
     ORDER BY similarity DESC, id ASC";

/// Vector store over the `document_chunks` table.
pub struct SqliteVectorStore {
    db: Database,
    embedder: CheckedEmbedder,
    options: StoreOptions,
}

impl SqliteVectorStore {
    pub fn new(db: Database, embedder: Arc<dyn EmbeddingAdapter>, options: StoreOptions) -> Self {
        Self {
            db,
            embedder: CheckedEmbedder::new(embedder, options.dimension),
            options,
        }
    }

    async fn insert_chunk(
        &self,
        document_name: &str,
        text: &str,
        embedding: &[f32],
        metadata: &Metadata,
        created_at: &str,
    ) -> Result<i64, CairnError> {
        let document_name = document_name.to_string();
        let text = text.to_string();
        let blob = vec_to_blob(embedding);
        let norm = f64::from(l2_norm(embedding));
        let metadata = serde_json::to_string(metadata).map_err(CairnError::storage)?;
        let created_at = created_at.to_string();

        self.db
            .connection()
            .call(move |conn| -> Result<i64, rusqlite::Error> {
                conn.execute(
                    "INSERT INTO document_chunks (document_name, chunk_text, embedding, norm, metadata, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    rusqlite::params![document_name, text, blob, norm, metadata, created_at],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(map_tr_err)
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn store(
        &self,
        chunks: &[String],
        document_name: &str,
        metadata: &Metadata,
    ) -> Result<(), CairnError> {
        let uploaded_at = Utc::now().to_rfc3339();
        for (index, text) in chunks.iter().enumerate() {
            let embedding = self.embedder.embed(text).await?;
            let chunk_meta = chunk_metadata(metadata, index, chunks.len(), &uploaded_at);
            let id = self
                .insert_chunk(document_name, text, &embedding, &chunk_meta, &uploaded_at)
                .await?;
            debug!(document = document_name, chunk = index, id, "chunk stored");
        }
        info!(backend = "sqlite", document = document_name, chunks = chunks.len(), "document stored");
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
        let query_norm = f64::from(l2_norm(&query_vec));
        let query_blob = vec_to_blob(&query_vec);
        let filter = filter.cloned().unwrap_or_default();
        let policy = self.options.untagged;

        let (hits, unreadable) = self
            .db
            .connection()
            .call(move |conn| -> Result<(Vec<SearchHit>, Vec<(i64, String)>), rusqlite::Error> {
                let mut stmt = conn.prepare(SEARCH_SQL)?;
                let mut rows = stmt.query(rusqlite::params![query_blob, query_norm])?;
                let mut hits = Vec::new();
                let mut unreadable = Vec::new();
                while let Some(row) = rows.next()? {
                    let id: i64 = row.get(0)?;
                    let raw_meta: String = row.get(3)?;
                    let metadata: Metadata = match serde_json::from_str(&raw_meta) {
                        Ok(metadata) => metadata,
                        Err(e) => {
                            unreadable.push((id, e.to_string()));
                            continue;
                        }
                    };
                    if !metadata_matches(&metadata, &filter, policy) {
                        continue;
                    }
                    let score: f64 = row.get(4)?;
                    hits.push(SearchHit {
                        chunk_id: id.to_string(),
                        document_name: row.get(1)?,
                        text: row.get(2)?,
                        metadata,
                        score: score as f32,
                    });
                    if hits.len() == limit {
                        break;
                    }
                }
                Ok((hits, unreadable))
            })
            .await
            .map_err(map_tr_err)?;

        for (id, error) in unreadable {
            warn!(chunk = id, error = %error, "skipping chunk with unreadable metadata");
        }
        Ok(hits)
    }

    async fn delete(&self, document_name: &str) -> Result<usize, CairnError> {
        let name = document_name.to_string();
        let removed = self
            .db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "DELETE FROM document_chunks WHERE document_name = ?1",
                    rusqlite::params![name],
                )
            })
            .await
            .map_err(map_tr_err)?;
        info!(backend = "sqlite", document = document_name, removed, "document deleted");
        Ok(removed)
    }

    async fn stats(&self) -> Result<StoreStats, CairnError> {
        self.db
            .connection()
            .call(|conn| {
                conn.query_row(
                    "SELECT COUNT(*), COUNT(DISTINCT document_name) FROM document_chunks",
                    [],
                    |row| {
                        let chunks: i64 = row.get(0)?;
                        let documents: i64 = row.get(1)?;
                        Ok(StoreStats {
                            total_chunks: chunks as usize,
                            total_documents: documents as usize,
                        })
                    },
                )
            })
            .await
            .map_err(map_tr_err)
    }

    async fn list_documents(&self) -> Result<Vec<DocumentSummary>, CairnError> {
        self.db
            .connection()
            .call(|conn| -> Result<Vec<DocumentSummary>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT document_name, COUNT(*), MAX(created_at) AS last_updated \
                     FROM document_chunks GROUP BY document_name \
                     ORDER BY last_updated DESC, document_name ASC",
                )?;
                let docs = stmt
                    .query_map([], |row| {
                        let chunks: i64 = row.get(1)?;
                        let last: Option<String> = row.get(2)?;
                        Ok(DocumentSummary {
                            name: row.get(0)?,
                            chunks: chunks as usize,
                            last_updated: last
                                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                                .map(|d| d.with_timezone(&Utc)),
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(docs)
            })
            .await
            .map_err(map_tr_err)
    }
}
