use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docsearch_core::persist::{load_index, save_index, save_meta, IndexPaths, MetaFile, FORMAT_VERSION};
use docsearch_core::source::{load_records, write_documenter_js};
use docsearch_core::tokenizer::DEFAULT_MIN_TOKEN_LEN;
use docsearch_core::{IndexBuilder, Page, ScoringConfig, Searcher, TokenizerConfig};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and query documentation search indices", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from search_index.js / JSON / JSONL files or a directory
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
        /// Apply English stemming to indexed and query terms
        #[arg(long, default_value_t = false)]
        stem: bool,
        /// Drop tokens shorter than this many characters
        #[arg(long, default_value_t = DEFAULT_MIN_TOKEN_LEN)]
        min_token_len: usize,
    },
    /// Run a query against a built index
    Search {
        /// Index directory
        #[arg(long)]
        index: String,
        /// Free-text query
        #[arg(long)]
        query: String,
        #[arg(long, default_value_t = 10, allow_negative_numbers = true)]
        limit: i64,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        offset: i64,
        /// Multiplier for matches inside fragment titles
        #[arg(long, default_value_t = docsearch_core::query::DEFAULT_TITLE_BOOST)]
        title_boost: f32,
    },
    /// Print index statistics
    Inspect {
        #[arg(long)]
        index: String,
    },
    /// Write the indexed fragments back out as search_index.js
    Export {
        #[arg(long)]
        index: String,
        #[arg(long)]
        output: String,
    },
}

#[derive(Serialize)]
struct Hit<'a> {
    fragment_id: u32,
    score: f32,
    matched_terms: Vec<&'a str>,
    location: &'a str,
    title: &'a str,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, stem, min_token_len } => {
            build_index(&input, &output, TokenizerConfig { min_token_len, stem })
        }
        Commands::Search { index, query, limit, offset, title_boost } => {
            run_search(&index, &query, limit, offset, ScoringConfig { title_boost })
        }
        Commands::Inspect { index } => inspect(&index),
        Commands::Export { index, output } => export(&index, &output),
    }
}

fn build_index(input: &str, output: &str, tokenizer: TokenizerConfig) -> Result<()> {
    let records = load_records(Path::new(input)).with_context(|| format!("reading fragments from {input}"))?;
    tracing::info!(records = records.len(), "ingested fragment records");

    // Malformed records are logged individually during ingestion.
    let (index, report) = IndexBuilder::new(tokenizer).build(records);

    let out_paths = IndexPaths::new(output);
    save_index(&out_paths.index(), &index)?;
    let meta = MetaFile {
        num_fragments: index.fragment_count() as u32,
        num_terms: index.term_count() as u32,
        created_at: time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339).unwrap_or_else(|_| "".into()),
        version: FORMAT_VERSION,
    };
    save_meta(&out_paths, &meta)?;

    tracing::info!(output, fragments = meta.num_fragments, terms = meta.num_terms, skipped = report.skipped.len(), "index build complete");
    Ok(())
}

fn run_search(index_dir: &str, query: &str, limit: i64, offset: i64, scoring: ScoringConfig) -> Result<()> {
    let index = load_index(&IndexPaths::new(index_dir).index())?;
    let page = Page::from_signed(limit, offset)?;
    let searcher = Searcher::new(&index, scoring)?;
    let results = searcher.search_page(query, page);

    let hits: Vec<Hit<'_>> = results
        .hits
        .iter()
        .map(|h| Hit {
            fragment_id: h.fragment.id,
            score: h.score,
            matched_terms: h.matched_terms.iter().map(String::as_str).collect(),
            location: &h.fragment.location,
            title: &h.fragment.title,
        })
        .collect();
    let out = serde_json::json!({ "query": query, "total_hits": results.total_hits, "results": hits });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn inspect(index_dir: &str) -> Result<()> {
    let index = load_index(&IndexPaths::new(index_dir).index())?;
    let config = index.tokenizer_config();
    let out = serde_json::json!({
        "format_version": FORMAT_VERSION,
        "fragments": index.fragment_count(),
        "terms": index.term_count(),
        "average_fragment_len": index.average_fragment_len(),
        "tokenizer": { "min_token_len": config.min_token_len, "stem": config.stem },
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn export(index_dir: &str, output: &str) -> Result<()> {
    let index = load_index(&IndexPaths::new(index_dir).index())?;
    let js = write_documenter_js(index.fragments())?;
    fs::write(output, js).with_context(|| format!("writing {output}"))?;
    tracing::info!(output, fragments = index.fragment_count(), "exported fragments");
    Ok(())
}
