//! Query engine: the immutable snapshot plus the per-request operations.
//!
//! An [`EngineSnapshot`] bundles the corpus, its composed texts, and the
//! similarity index built from their embeddings. All three share one
//! ordering. A snapshot is never mutated after construction; a reload builds
//! a new one and swaps it in whole (see [`crate::handle`]).
//!
//! # Query Pipeline
//!
//! 1. Trim the query; reject blank text with [`AdvisorError::EmptyQuery`].
//! 2. Embed the query via the [`EmbeddingProvider`].
//! 3. Rank with [`SimilarityIndex::top_k`].
//! 4. Map row positions back to [`CourseRecord`]s.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::compose::compose_all;
use crate::embedding::{embed_query, embed_texts, EmbeddingProvider};
use crate::error::{AdvisorError, Result};
use crate::index::SimilarityIndex;
use crate::models::{CourseCorpus, CourseField, CourseListing, QueryResult, SearchHit};

/// Everything a query needs, built once and then read-only.
#[derive(Debug)]
pub struct EngineSnapshot {
    corpus: CourseCorpus,
    texts: Vec<String>,
    index: SimilarityIndex,
    fields: Vec<CourseField>,
    model: String,
}

impl EngineSnapshot {
    /// Assemble a snapshot from precomputed parts.
    ///
    /// Fails unless corpus, texts, and index have identical length.
    pub fn from_parts(
        corpus: CourseCorpus,
        texts: Vec<String>,
        index: SimilarityIndex,
        fields: Vec<CourseField>,
        model: impl Into<String>,
    ) -> Result<Self> {
        if corpus.len() != texts.len() || corpus.len() != index.len() {
            return Err(AdvisorError::Index(format!(
                "length mismatch: {} courses, {} texts, {} vectors",
                corpus.len(),
                texts.len(),
                index.len()
            )));
        }
        Ok(Self {
            corpus,
            texts,
            index,
            fields,
            model: model.into(),
        })
    }

    /// Compose, embed, and index a corpus.
    ///
    /// This is the slow startup phase: one bulk provider call over every
    /// course.
    pub async fn build(
        corpus: CourseCorpus,
        fields: &[CourseField],
        provider: &dyn EmbeddingProvider,
    ) -> Result<Self> {
        let texts = compose_all(&corpus, fields);

        info!(
            courses = texts.len(),
            model = provider.model_name(),
            "encoding course texts"
        );
        let started = Instant::now();
        let vectors = embed_texts(provider, &texts).await?;
        info!(elapsed_ms = started.elapsed().as_millis() as u64, "done encoding");

        let index = SimilarityIndex::build(vectors)?;
        Self::from_parts(
            corpus,
            texts,
            index,
            fields.to_vec(),
            provider.model_name(),
        )
    }

    pub fn corpus(&self) -> &CourseCorpus {
        &self.corpus
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    pub fn index(&self) -> &SimilarityIndex {
        &self.index
    }

    pub fn fields(&self) -> &[CourseField] {
        &self.fields
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// A ready-to-query engine: a snapshot plus the provider used for queries.
///
/// Cloning is cheap (two `Arc`s).
#[derive(Clone)]
pub struct Engine {
    snapshot: Arc<EngineSnapshot>,
    provider: Arc<dyn EmbeddingProvider>,
}

impl Engine {
    pub fn new(snapshot: EngineSnapshot, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            snapshot: Arc::new(snapshot),
            provider,
        }
    }

    /// Build the snapshot for `corpus` and wrap it with `provider`.
    pub async fn build(
        corpus: CourseCorpus,
        fields: &[CourseField],
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let snapshot = EngineSnapshot::build(corpus, fields, provider.as_ref()).await?;
        Ok(Self::new(snapshot, provider))
    }

    pub fn snapshot(&self) -> &EngineSnapshot {
        &self.snapshot
    }

    pub fn courses_loaded(&self) -> usize {
        self.snapshot.corpus.len()
    }

    pub fn model_name(&self) -> &str {
        &self.snapshot.model
    }

    /// Rank courses against free-text `query`, returning at most `k` hits.
    pub async fn search(&self, query: &str, k: usize) -> Result<QueryResult> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AdvisorError::EmptyQuery);
        }

        let started = Instant::now();
        let query_vec = embed_query(self.provider.as_ref(), query).await?;
        let ranked = self.snapshot.index.top_k(&query_vec, k)?;

        let hits = ranked
            .into_iter()
            .enumerate()
            .filter_map(|(i, scored)| {
                self.snapshot
                    .corpus
                    .get(scored.index)
                    .map(|record| SearchHit {
                        rank: i + 1,
                        index: scored.index,
                        score: scored.score,
                        record: record.clone(),
                    })
            })
            .collect::<Vec<_>>();

        debug!(
            query,
            k,
            returned = hits.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "search complete"
        );

        Ok(QueryResult {
            query: query.to_string(),
            hits,
        })
    }

    /// Courses in corpus order, truncated at `limit`.
    pub fn list_all(&self, limit: Option<usize>) -> CourseListing<'_> {
        self.snapshot.corpus.list(limit)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("courses", &self.courses_loaded())
            .field("model", &self.model_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CourseRecord;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Maps each text to a one-hot-ish vector keyed by its first byte, and
    /// counts calls so tests can assert the provider was skipped.
    struct LetterProvider {
        calls: AtomicUsize,
    }

    impl LetterProvider {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for LetterProvider {
        fn model_name(&self) -> &str {
            "letters"
        }
        fn dims(&self) -> usize {
            26
        }
        async fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts
                .iter()
                .map(|t| {
                    let mut v = vec![0.0; 26];
                    for b in t.to_ascii_lowercase().bytes().filter(u8::is_ascii_lowercase) {
                        v[(b - b'a') as usize] += 1.0;
                    }
                    v
                })
                .collect())
        }
    }

    fn corpus() -> CourseCorpus {
        CourseCorpus::new(vec![
            CourseRecord::new("CS101", "aaa"),
            CourseRecord::new("CS201", "bbb"),
            CourseRecord::new("ENG100", "aaa"),
        ])
    }

    async fn engine() -> (Engine, Arc<LetterProvider>) {
        let provider = Arc::new(LetterProvider::new());
        let engine = Engine::build(corpus(), &[CourseField::Name], provider.clone())
            .await
            .unwrap();
        (engine, provider)
    }

    #[tokio::test]
    async fn test_blank_query_rejected_without_provider_call() {
        let (engine, provider) = engine().await;
        let before = provider.calls.load(Ordering::SeqCst);
        for q in ["", "   ", "\t\n"] {
            let err = engine.search(q, 3).await.unwrap_err();
            assert!(matches!(err, AdvisorError::EmptyQuery));
        }
        assert_eq!(provider.calls.load(Ordering::SeqCst), before);
    }

    #[tokio::test]
    async fn test_ties_preserve_corpus_order() {
        let (engine, _) = engine().await;
        let result = engine.search("a", 3).await.unwrap();
        let codes: Vec<&str> = result.hits.iter().map(|h| h.record.code.as_str()).collect();
        assert_eq!(codes, vec!["CS101", "ENG100", "CS201"]);
        assert_eq!(result.hits[0].rank, 1);
        assert!((result.hits[0].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_query_is_trimmed() {
        let (engine, _) = engine().await;
        let result = engine.search("  bbb  ", 1).await.unwrap();
        assert_eq!(result.query, "bbb");
        assert_eq!(result.hits[0].record.code, "CS201");
    }

    #[tokio::test]
    async fn test_result_count_is_min_of_k_and_size() {
        let (engine, _) = engine().await;
        for k in 0..6 {
            let result = engine.search("ab", k).await.unwrap();
            assert_eq!(result.hits.len(), k.min(3));
        }
    }

    #[tokio::test]
    async fn test_snapshot_lengths_match() {
        let (engine, _) = engine().await;
        let snap = engine.snapshot();
        assert_eq!(snap.corpus().len(), snap.texts().len());
        assert_eq!(snap.texts().len(), snap.index().len());
        assert_eq!(engine.courses_loaded(), 3);
        assert_eq!(engine.model_name(), "letters");
    }

    #[test]
    fn test_from_parts_rejects_length_mismatch() {
        let index = SimilarityIndex::build(vec![vec![1.0]]).unwrap();
        let err = EngineSnapshot::from_parts(
            corpus(),
            vec!["a".into(), "b".into(), "c".into()],
            index,
            vec![CourseField::Name],
            "m",
        )
        .unwrap_err();
        assert!(matches!(err, AdvisorError::Index(_)));
    }
}
