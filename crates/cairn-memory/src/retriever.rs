// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retrieval over the vector store with an optional rerank pass.
//!
//! The engine over-fetches `limit * candidate_multiplier` chunks by vector
//! similarity and hands them to a [`Reranker`]. The reranker may only reorder
//! and truncate that candidate set; if it fails or returns anything else the
//! engine falls back to plain similarity order and logs a warning.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use cairn_config::CairnConfig;
use cairn_core::CairnError;
use tracing::{debug, warn};

use crate::store::VectorStore;
use crate::types::{MetadataFilter, SearchHit};

/// Second-pass relevance scoring over a fixed candidate set.
#[async_trait]
pub trait Reranker: Send + Sync {
    fn name(&self) -> &str;

    /// Reorder `candidates` for `query` and keep at most `limit`.
    async fn rerank(
        &self,
        query: &str,
        candidates: Vec<SearchHit>,
        limit: usize,
    ) -> Result<Vec<SearchHit>, CairnError>;
}

/// Blends vector similarity with query-word overlap.
#[derive(Debug, Clone, Copy)]
pub struct LexicalReranker {
    pub vector_weight: f32,
    pub lexical_weight: f32,
}

impl Default for LexicalReranker {
    fn default() -> Self {
        Self {
            vector_weight: 0.7,
            lexical_weight: 0.3,
        }
    }
}

fn words(text: &str) -> HashSet<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

impl LexicalReranker {
    /// Fraction of distinct query words that also occur in `text`.
    pub fn overlap(query: &str, text: &str) -> f32 {
        let query_words = words(query);
        if query_words.is_empty() {
            return 0.0;
        }
        let text_words = words(text);
        let shared = query_words.intersection(&text_words).count();
        shared as f32 / query_words.len() as f32
    }
}

#[async_trait]
impl Reranker for LexicalReranker {
    fn name(&self) -> &str {
        "lexical"
    }

    async fn rerank(
        &self,
        query: &str,
        mut candidates: Vec<SearchHit>,
        limit: usize,
    ) -> Result<Vec<SearchHit>, CairnError> {
        for hit in &mut candidates {
            let overlap = Self::overlap(query, &hit.text);
            hit.score = self.vector_weight * hit.score + self.lexical_weight * overlap;
        }
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        candidates.truncate(limit);
        Ok(candidates)
    }
}

/// Vector search plus rerank, shared by every agent.
pub struct RetrievalEngine {
    store: Arc<dyn VectorStore>,
    reranker: Option<Arc<dyn Reranker>>,
    candidate_multiplier: usize,
    default_limit: usize,
}

impl RetrievalEngine {
    pub fn new(
        store: Arc<dyn VectorStore>,
        reranker: Option<Arc<dyn Reranker>>,
        candidate_multiplier: usize,
        default_limit: usize,
    ) -> Self {
        Self {
            store,
            reranker,
            candidate_multiplier: candidate_multiplier.max(1),
            default_limit,
        }
    }

    /// Engine with the lexical reranker when `retrieval.rerank` is on.
    pub fn from_config(store: Arc<dyn VectorStore>, config: &CairnConfig) -> Self {
        let retrieval = &config.retrieval;
        let reranker: Option<Arc<dyn Reranker>> = retrieval.rerank.then(|| {
            Arc::new(LexicalReranker {
                vector_weight: retrieval.vector_weight,
                lexical_weight: retrieval.lexical_weight,
            }) as Arc<dyn Reranker>
        });
        Self::new(
            store,
            reranker,
            retrieval.candidate_multiplier,
            retrieval.default_limit,
        )
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    pub fn default_limit(&self) -> usize {
        self.default_limit
    }

    /// Up to `limit` chunks relevant to `query`.
    ///
    /// Storage failures degrade to an empty result. Embedding failures and
    /// dimension mismatches are returned to the caller.
    pub async fn search(
        &self,
        query: &str,
        limit: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SearchHit>, CairnError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let fetch = match self.reranker {
            Some(_) => limit.saturating_mul(self.candidate_multiplier),
            None => limit,
        };

        let candidates = match self.store.search(query, fetch, filter).await {
            Ok(hits) => hits,
            Err(e @ CairnError::Storage { .. }) => {
                warn!(error = %e, backend = self.store.backend(), "vector search failed, returning no context");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let Some(reranker) = &self.reranker else {
            return Ok(candidates);
        };
        if candidates.is_empty() {
            return Ok(candidates);
        }

        let mut fallback = candidates.clone();
        fallback.truncate(limit);

        match reranker.rerank(query, candidates.clone(), limit).await {
            Ok(mut reranked) if is_reordering(&reranked, &candidates) => {
                reranked.truncate(limit);
                debug!(reranker = reranker.name(), candidates = candidates.len(), kept = reranked.len(), "reranked");
                Ok(reranked)
            }
            Ok(_) => {
                warn!(reranker = reranker.name(), "reranker returned chunks outside the candidate set, using vector order");
                Ok(fallback)
            }
            Err(e) => {
                warn!(reranker = reranker.name(), error = %e, "rerank failed, using vector order");
                Ok(fallback)
            }
        }
    }
}

/// True when `output` holds distinct chunks all drawn from `candidates`.
fn is_reordering(output: &[SearchHit], candidates: &[SearchHit]) -> bool {
    let allowed: HashSet<&str> = candidates.iter().map(|h| h.chunk_id.as_str()).collect();
    let mut seen = HashSet::new();
    output
        .iter()
        .all(|h| allowed.contains(h.chunk_id.as_str()) && seen.insert(h.chunk_id.as_str()))
}

/// Render hits as a numbered block for the system prompt. Empty input gives an empty string.
pub fn format_context(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return String::new();
    }
    let mut out = String::from("Relevant documents:\n");
    for (i, hit) in hits.iter().enumerate() {
        let _ = write!(
            out,
            "\n[{}] {} (relevance {:.2})\n{}\n",
            i + 1,
            hit.document_name,
            hit.score,
            hit.text.trim()
        );
    }
    out
}
