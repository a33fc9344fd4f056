// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock embedding adapter.
//!
//! Unscripted texts embed as a hashed bag of lowercase words, so texts that
//! share words point in similar directions. Text with no words embeds as the
//! zero vector.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use cairn_core::traits::adapter::PluginAdapter;
use cairn_core::traits::embedding::EmbeddingAdapter;
use cairn_core::types::{AdapterType, EmbeddingInput, EmbeddingOutput, HealthStatus};
use cairn_core::CairnError;

pub struct MockEmbedder {
    dimension: usize,
    scripted: HashMap<String, Vec<f32>>,
    fail_texts: HashSet<String>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl MockEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            scripted: HashMap::new(),
            fail_texts: HashSet::new(),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// Return exactly `vector` for `text`, whatever its length.
    pub fn with_vector(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.scripted.insert(text.into(), vector);
        self
    }

    /// Fail with a provider error whenever `text` is embedded.
    pub fn fail_on(mut self, text: impl Into<String>) -> Self {
        self.fail_texts.insert(text.into());
        self
    }

    /// Toggle failure for every call.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of texts embedded so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector_for(&self, text: &str) -> Result<Vec<f32>, CairnError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) || self.fail_texts.contains(text) {
            return Err(CairnError::provider("mock embedder: backend unavailable"));
        }
        if let Some(v) = self.scripted.get(text) {
            return Ok(v.clone());
        }
        Ok(bag_of_words(text, self.dimension))
    }
}

fn bag_of_words(text: &str, dimension: usize) -> Vec<f32> {
    let mut v = vec![0.0f32; dimension];
    if dimension == 0 {
        return v;
    }
    for word in text.split_whitespace() {
        // FNV-1a keeps buckets stable across runs.
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in word.to_lowercase().bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        v[(hash % dimension as u64) as usize] += 1.0;
    }
    v
}

#[async_trait]
impl PluginAdapter for MockEmbedder {
    fn name(&self) -> &str {
        "mock-embedder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, CairnError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl EmbeddingAdapter for MockEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, CairnError> {
        let embeddings = input
            .texts
            .iter()
            .map(|t| self.vector_for(t))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(EmbeddingOutput {
            embeddings,
            dimensions: self.dimension,
        })
    }
}
