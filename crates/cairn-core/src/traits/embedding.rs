// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding adapter trait for vector embedding generation.

use async_trait::async_trait;

use crate::error::CairnError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{EmbeddingInput, EmbeddingOutput};

/// Adapter for converting text into fixed-length vectors.
///
/// Failures (unreachable or erroring backend) are reported as
/// [`CairnError::Provider`] or [`CairnError::Timeout`], both recoverable.
#[async_trait]
pub trait EmbeddingAdapter: PluginAdapter {
    /// Generates embeddings for the given input.
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, CairnError>;

    /// Embeds a single text.
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, CairnError> {
        let output = self
            .embed(EmbeddingInput {
                texts: vec![text.to_string()],
            })
            .await?;
        output
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| CairnError::provider("embedding backend returned no vectors"))
    }
}
