//! Integration tests for the HTTP API.
//!
//! Each test starts the real axum server on a free port around an
//! [`EngineHandle`] built with a deterministic word-hashing embedder, then
//! drives it with `reqwest`.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use async_trait::async_trait;
use course_advisor::config::Config;
use course_advisor::server::run_server_with_handle;
use course_advisor_core::{
    CourseCorpus, CourseField, CourseRecord, EmbeddingProvider, Engine, EngineHandle,
};
use serde_json::{json, Value};

// ─── Test Providers ─────────────────────────────────────────────────

const DIMS: usize = 128;

/// Hashes lowercase word tokens into buckets. Identical text → identical vector.
struct HashingProvider;

#[async_trait]
impl EmbeddingProvider for HashingProvider {
    fn model_name(&self) -> &str {
        "hashing-test"
    }
    fn dims(&self) -> usize {
        DIMS
    }
    async fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut v = vec![0.0f32; DIMS];
                for token in text.split_whitespace() {
                    let mut h = DefaultHasher::new();
                    token.to_lowercase().hash(&mut h);
                    v[(h.finish() % DIMS as u64) as usize] += 1.0;
                }
                v
            })
            .collect())
    }
}

/// Embeds the corpus fine, then fails every later call (query time).
struct FlakyProvider {
    calls: std::sync::atomic::AtomicUsize,
}

#[async_trait]
impl EmbeddingProvider for FlakyProvider {
    fn model_name(&self) -> &str {
        "flaky"
    }
    fn dims(&self) -> usize {
        DIMS
    }
    async fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        let n = self
            .calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if n > 0 {
            anyhow::bail!("model server went away");
        }
        HashingProvider.embed(texts).await
    }
}

// ─── Fixtures ───────────────────────────────────────────────────────

fn catalog() -> CourseCorpus {
    CourseCorpus::new(vec![
        CourseRecord::new("CS101", "Introduction to Programming")
            .with_description("Python basics, variables, loops and functions")
            .with_department("Computer Science"),
        CourseRecord::new("CS201", "Data Structures")
            .with_description("Lists, trees, graphs and hash tables")
            .with_prerequisites("CS101")
            .with_department("Computer Science"),
        CourseRecord::new("ENG100", "Academic Writing").with_description("Essays and rhetoric"),
    ])
}

fn ten_courses() -> CourseCorpus {
    CourseCorpus::new(
        (0..10)
            .map(|i| CourseRecord::new(format!("C{:02}", i), format!("Course {}", i)))
            .collect(),
    )
}

async fn ready_handle(corpus: CourseCorpus, provider: Arc<dyn EmbeddingProvider>) -> Arc<EngineHandle> {
    let engine = Engine::build(corpus, &CourseField::default_text_fields(), provider)
        .await
        .unwrap();
    Arc::new(EngineHandle::ready(engine))
}

fn test_config(port: u16) -> Config {
    toml::from_str(&format!(
        r#"
[retrieval]
default_top_k = 5

[server]
bind = "127.0.0.1:{}"
"#,
        port
    ))
    .unwrap()
}

fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

async fn wait_for_server(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/api/health", port);
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return;
            }
        }
    }
    panic!("Server did not become ready within 5 seconds");
}

async fn start(handle: Arc<EngineHandle>) -> (u16, tokio::task::JoinHandle<()>) {
    let port = find_free_port();
    let cfg = test_config(port);
    let server = tokio::spawn(async move {
        run_server_with_handle(&cfg, handle).await.ok();
    });
    wait_for_server(port).await;
    (port, server)
}

// ─── Tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_health_reports_courses_loaded() {
    let (port, server) = start(ready_handle(catalog(), Arc::new(HashingProvider)).await).await;

    let body: Value = reqwest::get(format!("http://127.0.0.1:{}/api/health", port))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ready");
    assert_eq!(body["courses_loaded"], 3);
    assert_eq!(body["model"], "hashing-test");

    server.abort();
}

#[tokio::test]
async fn test_search_exact_text_ranks_first() {
    let (port, server) = start(ready_handle(catalog(), Arc::new(HashingProvider)).await).await;
    let client = reqwest::Client::new();

    let query = "Introduction to Programming Python basics, variables, loops and functions  Computer Science";
    let resp = client
        .post(format!("http://127.0.0.1:{}/api/search", port))
        .json(&json!({ "query": query, "top_k": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["query"], query);
    let courses = body["courses"].as_array().unwrap();
    assert_eq!(courses.len(), 3);
    assert_eq!(courses[0]["code"], "CS101");
    assert_eq!(courses[0]["title"], "Introduction to Programming");
    assert_eq!(courses[0]["department"], "Computer Science");
    assert!((courses[0]["similarity"].as_f64().unwrap() - 1.0).abs() < 1e-4);

    let eng = courses.iter().find(|c| c["code"] == "ENG100").unwrap();
    assert_eq!(eng["department"], "N/A");

    let scores: Vec<f64> = courses
        .iter()
        .map(|c| c["similarity"].as_f64().unwrap())
        .collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));

    server.abort();
}

#[tokio::test]
async fn test_search_defaults_and_clamps_top_k() {
    let (port, server) = start(ready_handle(ten_courses(), Arc::new(HashingProvider)).await).await;
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/api/search", port);

    let body: Value = client
        .post(&url)
        .json(&json!({ "query": "course" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["courses"].as_array().unwrap().len(), 5);

    let body: Value = client
        .post(&url)
        .json(&json!({ "query": "course", "top_k": 100 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["courses"].as_array().unwrap().len(), 10);

    let body: Value = client
        .post(&url)
        .json(&json!({ "query": "course", "topK": 0 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(body["courses"].as_array().unwrap().is_empty());

    server.abort();
}

#[tokio::test]
async fn test_blank_query_is_bad_request() {
    let (port, server) = start(ready_handle(catalog(), Arc::new(HashingProvider)).await).await;
    let client = reqwest::Client::new();

    for query in ["", "   "] {
        let resp = client
            .post(format!("http://127.0.0.1:{}/api/search", port))
            .json(&json!({ "query": query }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"]["code"], "bad_request");
    }

    server.abort();
}

#[tokio::test]
async fn test_list_courses_with_limit() {
    let (port, server) = start(ready_handle(ten_courses(), Arc::new(HashingProvider)).await).await;

    let body: Value = reqwest::get(format!("http://127.0.0.1:{}/api/courses?limit=2", port))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["total"], 10);
    let courses = body["courses"].as_array().unwrap();
    assert_eq!(courses.len(), 2);
    assert_eq!(courses[0]["code"], "C00");
    assert_eq!(courses[1]["code"], "C01");
    assert_eq!(courses[0]["description"], "");

    let body: Value = reqwest::get(format!("http://127.0.0.1:{}/api/courses", port))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["courses"].as_array().unwrap().len(), 10);

    server.abort();
}

#[tokio::test]
async fn test_not_ready_before_initialization() {
    let handle = Arc::new(EngineHandle::new());
    let (port, server) = start(handle.clone()).await;
    let client = reqwest::Client::new();

    let body: Value = client
        .get(format!("http://127.0.0.1:{}/api/health", port))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "loading");
    assert_eq!(body["courses_loaded"], 0);

    let resp = client
        .post(format!("http://127.0.0.1:{}/api/search", port))
        .json(&json!({ "query": "python" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 503);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "not_ready");

    let resp = client
        .get(format!("http://127.0.0.1:{}/api/courses", port))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 503);

    // Initialization finishes while the server is up.
    let engine = Engine::build(
        catalog(),
        &CourseField::default_text_fields(),
        Arc::new(HashingProvider),
    )
    .await
    .unwrap();
    handle.install(engine);

    let body: Value = client
        .get(format!("http://127.0.0.1:{}/api/health", port))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ready");
    assert_eq!(body["courses_loaded"], 3);

    server.abort();
}

#[tokio::test]
async fn test_failed_initialization_is_not_ready() {
    let handle = Arc::new(EngineHandle::new());
    handle.fail("required column 'Code' not found");
    let (port, server) = start(handle).await;

    let body: Value = reqwest::get(format!("http://127.0.0.1:{}/api/health", port))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "failed");
    assert!(body["error"].as_str().unwrap().contains("Code"));

    let resp = reqwest::Client::new()
        .post(format!("http://127.0.0.1:{}/api/search", port))
        .json(&json!({ "query": "python" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 503);

    server.abort();
}

#[tokio::test]
async fn test_provider_failure_is_per_request() {
    let provider = Arc::new(FlakyProvider {
        calls: std::sync::atomic::AtomicUsize::new(0),
    });
    let (port, server) = start(ready_handle(catalog(), provider).await).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://127.0.0.1:{}/api/search", port))
        .json(&json!({ "query": "python" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 502);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "embedding_failed");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("model server went away"));

    // The process and shared state survive.
    let body: Value = client
        .get(format!("http://127.0.0.1:{}/api/courses", port))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["total"], 3);

    server.abort();
}
