//! Exact similarity index over the course embedding matrix.
//!
//! Every query is a full linear scan: score each row by dot product with the
//! query vector, stable-sort descending, truncate to `k`. Rows with equal
//! scores keep corpus order. Vectors are expected to be unit length, so the
//! dot product is the cosine similarity.

use crate::embedding::dot;
use crate::error::{AdvisorError, Result};

/// One scored row of the index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredIndex {
    /// Row position, identical to the corpus position.
    pub index: usize,
    pub score: f32,
}

/// Immutable matrix of per-course vectors.
#[derive(Debug, Clone, Default)]
pub struct SimilarityIndex {
    vectors: Vec<Vec<f32>>,
    dims: usize,
}

impl SimilarityIndex {
    /// Build an index from an embedding matrix.
    ///
    /// All rows must share one dimensionality and hold only finite values.
    pub fn build(vectors: Vec<Vec<f32>>) -> Result<Self> {
        let dims = vectors.first().map(|v| v.len()).unwrap_or(0);
        for (row, v) in vectors.iter().enumerate() {
            if v.len() != dims {
                return Err(AdvisorError::Index(format!(
                    "row {} has {} dimensions, expected {}",
                    row,
                    v.len(),
                    dims
                )));
            }
            if v.iter().any(|x| !x.is_finite()) {
                return Err(AdvisorError::Index(format!(
                    "row {} contains a non-finite value",
                    row
                )));
            }
        }
        Ok(Self { vectors, dims })
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Vector dimensionality, `0` for an empty index.
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// The `k` rows most similar to `query`, best first.
    ///
    /// `k` is clamped to the index size; `k == 0` yields an empty result.
    pub fn top_k(&self, query: &[f32], k: usize) -> Result<Vec<ScoredIndex>> {
        let k = k.min(self.vectors.len());
        if k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dims {
            return Err(AdvisorError::Index(format!(
                "query has {} dimensions, index has {}",
                query.len(),
                self.dims
            )));
        }

        let mut scored: Vec<ScoredIndex> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(index, v)| ScoredIndex {
                index,
                score: rank_score(dot(query, v)),
            })
            .collect();

        // Vec::sort_by is stable: equal scores stay in corpus order.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        Ok(scored)
    }
}

/// NaN ranks last; `-0.0` folds into `0.0` so it ties with it.
fn rank_score(score: f32) -> f32 {
    if score.is_nan() {
        f32::NEG_INFINITY
    } else {
        score + 0.0
    }
}
