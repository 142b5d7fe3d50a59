//! # Course Advisor
//!
//! Semantic search over a university course catalog.
//!
//! A user describes the course they want in free text; Course Advisor
//! returns the catalog entries whose content matches best, ranked by cosine
//! similarity between sentence embeddings.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  Catalog    │──▶│ Compose +    │──▶│ Similarity   │
//! │  (CSV)      │   │ Embed (bulk) │   │ Index        │
//! └─────────────┘   └──────────────┘   └──────┬───────┘
//!                                             │
//!                      ┌──────────────────────┤
//!                      ▼                      ▼
//!                 ┌──────────┐          ┌──────────┐
//!                 │   CLI    │          │   HTTP   │
//!                 │(advisor) │          │  (/api)  │
//!                 └──────────┘          └──────────┘
//! ```
//!
//! ## Data Flow
//!
//! 1. The **catalog loader** ([`catalog`]) reads the course CSV into a
//!    `CourseCorpus`, warning about missing optional columns.
//! 2. **Bootstrap** ([`bootstrap`]) composes one text per course, embeds all
//!    of them through the configured **embedding provider** ([`embedding`]),
//!    and builds the similarity index into an immutable engine snapshot.
//! 3. The engine is installed into a shared `EngineHandle`; the **HTTP
//!    server** ([`server`]) and **CLI** ([`search`]) query it.
//!
//! The algorithmic core (composition, index, engine) lives in the
//! `course-advisor-core` crate.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`catalog`] | CSV catalog loader |
//! | [`embedding`] | Concrete embedding providers |
//! | [`bootstrap`] | Engine initialization and reload |
//! | [`server`] | HTTP API |
//! | [`search`] | CLI commands |

pub mod bootstrap;
pub mod catalog;
pub mod config;
pub mod embedding;
pub mod search;
pub mod server;
