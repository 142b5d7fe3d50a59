//! Process-wide readiness state for the engine.
//!
//! The access surface starts before initialization finishes. Until an engine
//! is installed every request sees [`AdvisorError::NotReady`]; once installed,
//! requests clone the current `Arc<Engine>` and keep using it even if a
//! reload swaps in a newer one mid-request.

use std::sync::{Arc, RwLock};

use serde::Serialize;

use crate::engine::Engine;
use crate::error::{AdvisorError, Result};

/// Lifecycle of the shared engine.
#[derive(Debug, Clone)]
pub enum Readiness {
    Loading,
    Ready(Arc<Engine>),
    Failed(String),
}

/// Readiness as reported on the wire: `"loading"`, `"ready"`, or `"failed"`.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Loading,
    Ready,
    Failed,
}

/// Health summary reported by the access surface.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HealthStatus {
    pub status: HealthState,
    pub courses_loaded: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthStatus {
    pub fn is_ready(&self) -> bool {
        self.status == HealthState::Ready
    }
}

/// Shared, swappable holder of the current engine.
#[derive(Debug)]
pub struct EngineHandle {
    state: RwLock<Readiness>,
}

impl EngineHandle {
    /// A handle in the `Loading` state.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(Readiness::Loading),
        }
    }

    /// A handle that is ready immediately.
    pub fn ready(engine: Engine) -> Self {
        Self {
            state: RwLock::new(Readiness::Ready(Arc::new(engine))),
        }
    }

    fn read(&self) -> Readiness {
        match self.state.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// The engine currently serving queries.
    pub fn engine(&self) -> Result<Arc<Engine>> {
        match self.read() {
            Readiness::Ready(engine) => Ok(engine),
            Readiness::Loading => Err(AdvisorError::NotReady(
                "initialization in progress".to_string(),
            )),
            Readiness::Failed(reason) => Err(AdvisorError::NotReady(format!(
                "initialization failed: {}",
                reason
            ))),
        }
    }

    /// Atomically replace whatever is installed with `engine`.
    pub fn install(&self, engine: Engine) {
        let next = Readiness::Ready(Arc::new(engine));
        match self.state.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    /// Record a failed initialization.
    ///
    /// Only applies while still `Loading`: a failed reload leaves the
    /// previously installed engine in service. Returns whether the state
    /// changed.
    pub fn fail(&self, reason: impl Into<String>) -> bool {
        let mut guard = match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if matches!(*guard, Readiness::Loading) {
            *guard = Readiness::Failed(reason.into());
            true
        } else {
            false
        }
    }

    pub fn status(&self) -> HealthStatus {
        match self.read() {
            Readiness::Loading => HealthStatus {
                status: HealthState::Loading,
                courses_loaded: 0,
                model: None,
                error: None,
            },
            Readiness::Ready(engine) => HealthStatus {
                status: HealthState::Ready,
                courses_loaded: engine.courses_loaded(),
                model: Some(engine.model_name().to_string()),
                error: None,
            },
            Readiness::Failed(reason) => HealthStatus {
                status: HealthState::Failed,
                courses_loaded: 0,
                model: None,
                error: Some(reason),
            },
        }
    }
}

impl Default for EngineHandle {
    fn default() -> Self {
        Self::new()
    }
}
