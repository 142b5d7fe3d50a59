//! CLI commands: one-shot search, the interactive prompt, listing, and
//! catalog checks.
//!
//! Output goes to stdout in a human-readable layout; progress and warnings
//! go through `tracing` to stderr.

use anyhow::{Context, Result};
use course_advisor_core::{AdvisorError, CourseCorpus, Engine, QueryResult};
use std::io::{BufRead, Write};

use crate::bootstrap::initialize;
use crate::catalog::load_catalog;
use crate::config::Config;

/// Descriptions longer than this are cut when printed.
pub const MAX_DESC_LEN: usize = 220;

/// Words that leave the interactive prompt (case-insensitive).
const EXIT_WORDS: [&str; 3] = ["q", "quit", "exit"];

/// `advisor search "<query>"`.
pub async fn run_search(config: &Config, query: &str, top_k: Option<usize>) -> Result<()> {
    if query.trim().is_empty() {
        return Err(AdvisorError::EmptyQuery.into());
    }
    let engine = initialize(config)
        .await
        .context("failed to initialize search engine")?;
    let k = top_k.unwrap_or(config.retrieval.default_top_k);
    let result = engine.search(query, k).await?;
    print!("{}", render_results(&result));
    Ok(())
}

/// `advisor interactive`: read queries from stdin until an exit word or EOF.
pub async fn run_interactive(config: &Config, top_k: Option<usize>) -> Result<()> {
    println!("--- Course Advisor: Semantic Search ---");
    let engine = initialize(config)
        .await
        .context("failed to initialize search engine")?;
    let k = top_k.unwrap_or(config.retrieval.default_top_k);

    println!();
    println!("Describe the kind of course you're looking for.");
    println!("Examples:");
    println!("  - I want a beginner AI class with python");
    println!("  - Upper-level data science course with lots of projects");
    println!("  - Easy humanities gen-ed that focuses on culture and history");
    println!("Type 'q' or 'quit' to exit.");
    println!();

    let stdin = std::io::stdin();
    repl(&engine, k, stdin.lock(), std::io::stdout()).await
}

/// The prompt loop, generic over input/output for testing.
async fn repl<R: BufRead, W: Write>(engine: &Engine, k: usize, input: R, mut out: W) -> Result<()> {
    let mut lines = input.lines();
    loop {
        write!(out, "Describe your ideal course: ")?;
        out.flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => break,
        };
        let query = line.trim();

        if is_exit_word(query) {
            break;
        }
        if query.is_empty() {
            writeln!(
                out,
                "Empty query. Please type a description of what you're looking for."
            )?;
            continue;
        }

        match engine.search(query, k).await {
            Ok(result) => write!(out, "{}", render_results(&result))?,
            Err(e) => writeln!(out, "Search failed: {}", e)?,
        }
    }
    writeln!(out, "Exiting. Goodbye!")?;
    Ok(())
}

fn is_exit_word(input: &str) -> bool {
    EXIT_WORDS.iter().any(|w| input.eq_ignore_ascii_case(w))
}

/// Format ranked results the way the CLI prints them.
pub fn render_results(result: &QueryResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("\nQuery: \"{}\"\n", result.query));
    out.push_str(&"-".repeat(80));
    out.push('\n');

    if result.hits.is_empty() {
        out.push_str("No results.\n");
        return out;
    }

    out.push_str("Top matching courses:\n\n");
    for hit in &result.hits {
        let r = &hit.record;
        out.push_str(&format!("{}. {} - {}\n", hit.rank, r.code, r.name));
        out.push_str(&format!(
            "   Department: {}\n",
            r.department.as_deref().unwrap_or("N/A")
        ));
        out.push_str(&format!("   Similarity: {:.3}\n", hit.score));
        if let Some(desc) = r.description.as_deref() {
            out.push_str(&format!("   Description: {}\n", truncate(desc, MAX_DESC_LEN)));
        }
        out.push('\n');
    }
    out
}

/// Cut `text` to `max` characters, appending `...` when shortened.
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

/// `advisor list`: print courses in catalog order. Needs no model.
pub fn run_list(config: &Config, limit: Option<usize>) -> Result<()> {
    let corpus = load_catalog(&config.catalog.path)?;
    print!("{}", render_listing(&corpus, limit));
    Ok(())
}

fn render_listing(corpus: &CourseCorpus, limit: Option<usize>) -> String {
    let listing = corpus.list(limit);
    let width = listing
        .courses
        .iter()
        .map(|c| c.code.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for course in &listing.courses {
        out.push_str(&format!("{:<width$}  {}\n", course.code, course.name, width = width));
    }
    out.push_str(&format!(
        "showing {} of {} courses\n",
        listing.courses.len(),
        listing.total
    ));
    out
}

/// `advisor check`: load the catalog and report its shape. Needs no model.
pub fn run_check(config: &Config) -> Result<()> {
    let corpus = load_catalog(&config.catalog.path)?;
    let fields = config.catalog.fields()?;

    println!("Catalog:      {}", config.catalog.path.display());
    println!("Courses:      {}", corpus.len());
    println!(
        "Text fields:  {}",
        fields
            .iter()
            .map(|f| f.column())
            .collect::<Vec<_>>()
            .join(", ")
    );
    if corpus.missing_columns().is_empty() {
        println!("Columns:      ok");
    } else {
        println!(
            "Columns:      degraded (missing {})",
            corpus
                .missing_columns()
                .iter()
                .map(|f| f.column())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    let described = corpus.iter().filter(|c| c.description.is_some()).count();
    println!("Described:    {} / {}", described, corpus.len());
    Ok(())
}
