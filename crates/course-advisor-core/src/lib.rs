//! # Course Advisor Core
//!
//! Runtime-agnostic logic for Course Advisor: the course data model, text
//! composition, the embedding provider trait, the exact similarity index,
//! and the query engine with its readiness handle.
//!
//! This crate contains no tokio, filesystem, or network dependencies.
//! Catalog loading and concrete embedding providers live in the
//! `course-advisor` app crate.

pub mod compose;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod handle;
pub mod index;
pub mod models;

pub use compose::{compose, compose_all};
pub use embedding::{embed_query, embed_texts, EmbeddingProvider};
pub use engine::{Engine, EngineSnapshot};
pub use error::{AdvisorError, Result};
pub use handle::{EngineHandle, HealthState, HealthStatus, Readiness};
pub use index::{ScoredIndex, SimilarityIndex};
pub use models::{CourseCorpus, CourseField, CourseListing, CourseRecord, QueryResult, SearchHit};
