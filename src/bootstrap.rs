//! Engine initialization and reload.
//!
//! Initialization is the one slow phase of the process: load the catalog,
//! load the embedding model, embed every course. It runs once before the
//! engine is installed into the shared [`EngineHandle`]; until then the
//! access surface answers "not ready".
//!
//! A reload repeats the whole pipeline off to the side and swaps the
//! finished engine in with a single [`EngineHandle::install`], so no request
//! ever sees a new corpus paired with an old embedding matrix.

use std::sync::Arc;
use std::time::Instant;

use course_advisor_core::{AdvisorError, Engine, EngineHandle, Result};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::catalog::load_catalog;
use crate::config::Config;
use crate::embedding::create_provider;

/// Build a complete engine from configuration.
pub async fn initialize(config: &Config) -> Result<Engine> {
    let started = Instant::now();
    let fields = config
        .catalog
        .fields()
        .map_err(|e| AdvisorError::Config(e.to_string()))?;

    info!(path = %config.catalog.path.display(), "loading course data");
    let path = config.catalog.path.clone();
    let corpus = tokio::task::spawn_blocking(move || load_catalog(&path))
        .await
        .map_err(|e| AdvisorError::DataSource {
            path: config.catalog.path.display().to_string(),
            reason: e.to_string(),
        })??;

    info!(provider = %config.embedding.provider, "loading embedding provider");
    let embedding_config = config.embedding.clone();
    let provider = tokio::task::spawn_blocking(move || create_provider(&embedding_config))
        .await
        .map_err(|e| AdvisorError::ProviderInit(e.to_string()))??;

    let engine = Engine::build(corpus, &fields, provider).await?;
    info!(
        courses = engine.courses_loaded(),
        model = engine.model_name(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "engine ready"
    );
    Ok(engine)
}

/// Initialize in the background and publish the outcome on `handle`.
pub fn spawn_initialization(handle: Arc<EngineHandle>, config: Arc<Config>) -> JoinHandle<()> {
    tokio::spawn(async move {
        match initialize(&config).await {
            Ok(engine) => handle.install(engine),
            Err(e) => {
                error!(error = %e, "initialization failed");
                handle.fail(e.to_string());
            }
        }
    })
}

/// Rebuild the engine and swap it in atomically.
///
/// On failure the handle is left as it was: a serving engine keeps serving,
/// and an initial load still in progress still owns the outcome.
pub async fn reload(handle: &EngineHandle, config: &Config) -> Result<usize> {
    info!("reloading course catalog");
    match initialize(config).await {
        Ok(engine) => {
            let courses = engine.courses_loaded();
            handle.install(engine);
            info!(courses, "reload complete");
            Ok(courses)
        }
        Err(e) => {
            error!(error = %e, "reload failed; keeping current engine");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use course_advisor_core::{
        CourseCorpus, CourseField, CourseRecord, EmbeddingProvider, HealthState,
    };
    use std::path::PathBuf;

    struct LengthProvider;

    #[async_trait]
    impl EmbeddingProvider for LengthProvider {
        fn model_name(&self) -> &str {
            "length"
        }
        fn dims(&self) -> usize {
            2
        }
        async fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }
    }

    async fn engine_with(n: usize) -> Engine {
        let corpus = CourseCorpus::new(
            (0..n)
                .map(|i| CourseRecord::new(format!("C{}", i), format!("Course {}", i)))
                .collect(),
        );
        Engine::build(corpus, &[CourseField::Name], Arc::new(LengthProvider))
            .await
            .unwrap()
    }

    fn config_for(path: PathBuf) -> Config {
        let mut config = Config::default();
        config.catalog.path = path;
        config
    }

    #[tokio::test]
    async fn test_missing_catalog_is_data_source_error() {
        let config = config_for(PathBuf::from("/no/such/catalog.csv"));
        let err = initialize(&config).await.unwrap_err();
        assert!(matches!(err, AdvisorError::DataSource { .. }));
        assert!(err.is_startup());
    }

    #[tokio::test]
    async fn test_schema_error_before_model_load() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("courses.csv");
        std::fs::write(&path, "Title,Description\nIntro,Basics\n").unwrap();

        let err = initialize(&config_for(path)).await.unwrap_err();
        assert!(matches!(err, AdvisorError::Schema { .. }));
    }

    #[tokio::test]
    async fn test_failed_background_init_marks_handle() {
        let handle = Arc::new(EngineHandle::new());
        let config = Arc::new(config_for(PathBuf::from("/no/such/catalog.csv")));
        spawn_initialization(handle.clone(), config).await.unwrap();

        let status = handle.status();
        assert_eq!(status.status, HealthState::Failed);
        assert!(status.error.unwrap().contains("catalog source unreadable"));
        assert!(handle.engine().is_err());
    }

    #[tokio::test]
    async fn test_invalid_text_field_is_config_error() {
        let mut config = Config::default();
        config.catalog.text_fields = vec!["Syllabus".to_string()];
        let err = initialize(&config).await.unwrap_err();
        assert!(matches!(err, AdvisorError::Config(_)));
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_serving_engine() {
        let handle = EngineHandle::ready(engine_with(4).await);
        let config = config_for(PathBuf::from("/no/such/catalog.csv"));

        let err = reload(&handle, &config).await.unwrap_err();
        assert!(matches!(err, AdvisorError::DataSource { .. }));

        let status = handle.status();
        assert!(status.is_ready());
        assert_eq!(status.courses_loaded, 4);
        assert_eq!(handle.engine().unwrap().courses_loaded(), 4);
    }

    #[tokio::test]
    async fn test_failed_reload_during_startup_stays_loading() {
        let handle = EngineHandle::new();
        let config = config_for(PathBuf::from("/no/such/catalog.csv"));

        assert!(reload(&handle, &config).await.is_err());
        assert_eq!(handle.status().status, HealthState::Loading);

        // The initial load can still publish its engine afterwards.
        handle.install(engine_with(2).await);
        assert_eq!(handle.status().courses_loaded, 2);
    }
}
