//! Embedding provider trait and vector utilities.
//!
//! Defines the [`EmbeddingProvider`] trait that all embedding backends
//! implement, the [`embed_texts`] / [`embed_query`] entry points that enforce
//! the provider contract (one vector per input, fixed dimensionality, unit
//! L2 norm), plus pure helpers for similarity computation.
//!
//! Concrete providers (fastembed, Ollama, OpenAI) live in the `course-advisor`
//! app crate.

use async_trait::async_trait;

use crate::error::{AdvisorError, Result};

/// Trait for embedding providers.
///
/// Implementations are loaded once per process. `embed` must return one
/// vector per input text, in input order. Normalization is applied by
/// [`embed_texts`], so providers may return raw model output.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"all-minilm-l6-v2"`).
    fn model_name(&self) -> &str;
    /// Returns the embedding vector dimensionality (e.g. `384`).
    fn dims(&self) -> usize;
    /// Embed a batch of texts.
    async fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Embed a batch of texts and L2-normalize the results.
///
/// Makes exactly one provider call. A provider error, a count mismatch, a
/// vector of the wrong dimensionality, or a NaN/infinite component is
/// reported as [`AdvisorError::ProviderRuntime`].
pub async fn embed_texts(
    provider: &dyn EmbeddingProvider,
    texts: &[String],
) -> Result<Vec<Vec<f32>>> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    let mut vectors = provider
        .embed(texts)
        .await
        .map_err(|e| AdvisorError::ProviderRuntime(format!("{:#}", e)))?;

    if vectors.len() != texts.len() {
        return Err(AdvisorError::ProviderRuntime(format!(
            "provider returned {} vectors for {} texts",
            vectors.len(),
            texts.len()
        )));
    }

    let dims = provider.dims();
    for (i, v) in vectors.iter_mut().enumerate() {
        if v.len() != dims {
            return Err(AdvisorError::ProviderRuntime(format!(
                "vector {} has {} dimensions, expected {}",
                i,
                v.len(),
                dims
            )));
        }
        if v.iter().any(|x| !x.is_finite()) {
            return Err(AdvisorError::ProviderRuntime(format!(
                "vector {} contains a non-finite value",
                i
            )));
        }
        if !l2_normalize(v) {
            tracing::warn!(index = i, "embedding has zero norm; left unnormalized");
        }
    }

    Ok(vectors)
}

/// Embed a single query text.
///
/// Convenience wrapper around [`embed_texts`].
pub async fn embed_query(provider: &dyn EmbeddingProvider, text: &str) -> Result<Vec<f32>> {
    embed_texts(provider, &[text.to_string()])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AdvisorError::ProviderRuntime("empty embedding response".to_string()))
}

/// Euclidean length of a vector.
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Scale `v` to unit length in place.
///
/// Returns `false` (and leaves `v` untouched) for a zero vector.
pub fn l2_normalize(v: &mut [f32]) -> bool {
    let norm = l2_norm(v);
    if norm < f32::EPSILON {
        return false;
    }
    for x in v.iter_mut() {
        *x /= norm;
    }
    true
}

/// Dot product. Equal to cosine similarity when both inputs are unit vectors.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`:
/// - `1.0` = identical direction
/// - `0.0` = orthogonal (unrelated)
/// - `-1.0` = opposite direction
///
/// Returns `0.0` for empty vectors or vectors of different lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let denom = l2_norm(a) * l2_norm(b);
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot(a, b) / denom
}
