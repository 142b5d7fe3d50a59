//! Error taxonomy shared by every layer of Course Advisor.
//!
//! Startup errors ([`DataSource`](AdvisorError::DataSource),
//! [`Schema`](AdvisorError::Schema), [`ProviderInit`](AdvisorError::ProviderInit))
//! abort initialization. Per-request errors ([`EmptyQuery`](AdvisorError::EmptyQuery),
//! [`ProviderRuntime`](AdvisorError::ProviderRuntime), [`NotReady`](AdvisorError::NotReady))
//! are returned to the caller and never touch shared state.

use thiserror::Error;

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, AdvisorError>;

/// Errors produced while loading, indexing, or querying the course catalog.
#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("catalog source unreadable ({path}): {reason}")]
    DataSource { path: String, reason: String },

    #[error("required column '{column}' not found in catalog {path}")]
    Schema { column: String, path: String },

    #[error("failed to initialize embedding provider: {0}")]
    ProviderInit(String),

    #[error("query must not be empty")]
    EmptyQuery,

    #[error("embedding provider failed: {0}")]
    ProviderRuntime(String),

    #[error("similarity index error: {0}")]
    Index(String),

    #[error("engine not ready: {0}")]
    NotReady(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl AdvisorError {
    /// Whether this error is fatal at startup rather than scoped to one request.
    pub fn is_startup(&self) -> bool {
        matches!(
            self,
            AdvisorError::DataSource { .. }
                | AdvisorError::Schema { .. }
                | AdvisorError::ProviderInit(_)
                | AdvisorError::Config(_)
        )
    }
}
