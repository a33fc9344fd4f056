// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chunk records, search hits, and vector math shared by both backends.

use std::collections::BTreeMap;

use cairn_config::UntaggedPolicy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Open string-keyed chunk metadata.
pub type Metadata = serde_json::Map<String, Value>;

/// Exact-match filter over metadata fields.
pub type MetadataFilter = BTreeMap<String, String>;

/// Metadata keys written by `store` on every chunk.
pub const KEY_CHUNK_INDEX: &str = "chunk_index";
pub const KEY_NUM_CHUNKS: &str = "num_chunks";
pub const KEY_UPLOADED_AT: &str = "uploaded_at";

/// A chunk as persisted by the JSON file backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub id: String,
    pub document_name: String,
    pub chunk_text: String,
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub metadata: Metadata,
}

/// One search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub chunk_id: String,
    pub document_name: String,
    pub text: String,
    pub metadata: Metadata,
    /// Cosine similarity, or the reranked score after a rerank pass.
    pub score: f32,
}

/// Aggregate counts over the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub total_chunks: usize,
    pub total_documents: usize,
}

/// Per-document listing entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSummary {
    pub name: String,
    pub chunks: usize,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Serialize an f32 vector as a little-endian byte BLOB.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Inverse of [`vec_to_blob`]. Trailing bytes that do not form a full f32 are ignored.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine similarity `dot(a, b) / (|a| * |b|)`.
///
/// Returns exactly `0.0` when either vector has zero norm or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

/// Whether `metadata` passes every clause of `filter`.
///
/// A field missing from the chunk passes under [`UntaggedPolicy::Visible`] and
/// fails under [`UntaggedPolicy::Isolated`]. Non-string values compare by
/// their JSON text.
pub fn metadata_matches(metadata: &Metadata, filter: &MetadataFilter, policy: UntaggedPolicy) -> bool {
    filter.iter().all(|(key, wanted)| match metadata.get(key) {
        None | Some(Value::Null) => policy == UntaggedPolicy::Visible,
        Some(Value::String(s)) => s == wanted,
        Some(other) => other.to_string() == *wanted,
    })
}

/// Caller metadata plus the reserved per-chunk keys.
pub(crate) fn chunk_metadata(base: &Metadata, index: usize, total: usize, uploaded_at: &str) -> Metadata {
    let mut metadata = base.clone();
    metadata.insert(KEY_CHUNK_INDEX.to_string(), Value::from(index));
    metadata.insert(KEY_NUM_CHUNKS.to_string(), Value::from(total));
    metadata.insert(KEY_UPLOADED_AT.to_string(), Value::from(uploaded_at));
    metadata
}
