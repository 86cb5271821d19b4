use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use axum::extract::rejection::QueryRejection;
use docsearch_core::persist::load_index;
use docsearch_core::{Category, Error, IndexHandle, Page, ScoringConfig, Searcher};
use html_escape::encode_text;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

const SNIPPET_BEFORE: usize = 80;
const SNIPPET_AFTER: usize = 160;

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}
fn default_limit() -> i64 { 10 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub generation: u64,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub fragment_id: u32,
    pub score: f32,
    pub matched_terms: Vec<String>,
    pub location: String,
    pub page: String,
    pub title: String,
    pub category: Category,
    pub snippet: Option<String>,
}

/// Serve-time settings.
#[derive(Debug, Clone, Copy)]
pub struct ServeConfig {
    pub scoring: ScoringConfig,
    /// Largest accepted `limit`; larger requests are rejected, not clamped.
    pub max_limit: usize,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self { scoring: ScoringConfig::default(), max_limit: 100 }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub handle: Arc<IndexHandle>,
    pub config: ServeConfig,
}

/// Error body returned to HTTP callers.
pub struct ApiError(StatusCode, String);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match err {
            Error::InvalidQueryParameter(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(serde_json::json!({ "error": self.1 }))).into_response()
    }
}

/// Load the index at startup. Any format error is returned so the process
/// refuses to serve rather than ranking with a misread index.
pub fn load_handle(index_path: &FsPath) -> docsearch_core::Result<Arc<IndexHandle>> {
    let index = load_index(index_path)?;
    tracing::info!(path = %index_path.display(), fragments = index.fragment_count(), terms = index.term_count(), "loaded index");
    Ok(Arc::new(IndexHandle::new(index)))
}

pub fn build_app(handle: Arc<IndexHandle>, config: ServeConfig) -> anyhow::Result<Router> {
    config.scoring.validate()?;
    let app_state = AppState { handle, config };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/fragment/:fragment_id", get(fragment_handler))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);
    Ok(app)
}

pub async fn search_handler(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = Instant::now();
    let Query(params) = params.map_err(|rejection| Error::InvalidQueryParameter(rejection.body_text()))?;
    let page = Page::from_signed(params.limit, params.offset)?;
    if page.limit > state.config.max_limit {
        return Err(Error::InvalidQueryParameter(format!(
            "limit {} exceeds maximum {}",
            page.limit, state.config.max_limit
        ))
        .into());
    }

    // Snapshot: a concurrent publish does not affect this request.
    let published = state.handle.current();
    let searcher = Searcher::new(&published.index, state.config.scoring)?;
    let results = searcher.search_page(&params.q, page);

    let hits = results
        .hits
        .into_iter()
        .map(|hit| {
            let terms: Vec<String> = hit.matched_terms.into_iter().collect();
            let source = if hit.fragment.text.trim().is_empty() { &hit.fragment.title } else { &hit.fragment.text };
            SearchHit {
                fragment_id: hit.fragment.id,
                score: hit.score,
                snippet: snippet(source, &terms),
                matched_terms: terms,
                location: hit.fragment.location.clone(),
                page: hit.fragment.page.clone(),
                title: hit.fragment.title.clone(),
                category: hit.fragment.category,
            }
        })
        .collect();

    let elapsed = start.elapsed();
    Ok(Json(SearchResponse {
        query: params.q,
        took_s: elapsed.as_secs_f64(),
        total_hits: results.total_hits,
        generation: published.generation,
        results: hits,
    }))
}

pub async fn fragment_handler(
    State(state): State<AppState>,
    Path(fragment_id): Path<u32>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let published = state.handle.current();
    match published.index.fragment(fragment_id) {
        Some(f) => Ok(Json(serde_json::json!({
            "fragment_id": f.id,
            "location": f.location,
            "page": f.page,
            "title": f.title,
            "text": f.text,
            "category": f.category,
        }))),
        None => Err(ApiError(StatusCode::NOT_FOUND, format!("fragment {fragment_id} not found"))),
    }
}

fn terms_regex(terms: &[String]) -> Option<Regex> {
    let alternatives: Vec<String> = terms.iter().filter(|t| !t.trim().is_empty()).map(|t| regex::escape(t)).collect();
    if alternatives.is_empty() {
        return None;
    }
    RegexBuilder::new(&alternatives.join("|")).case_insensitive(true).build().ok()
}

/// Cut a window around the first matched term, HTML-escape it and wrap
/// matches in `<em>`.
fn snippet(text: &str, terms: &[String]) -> Option<String> {
    if text.trim().is_empty() { return None; }
    let pattern = terms_regex(terms);
    let window = match pattern.as_ref().and_then(|re| re.find(text)) {
        Some(m) => {
            let start = floor_boundary(text, m.start().saturating_sub(SNIPPET_BEFORE));
            let end = ceil_boundary(text, (m.start() + SNIPPET_AFTER).min(text.len()));
            &text[start..end]
        }
        None => &text[..ceil_boundary(text, SNIPPET_AFTER.min(text.len()))],
    };
    let Some(re) = pattern else { return Some(encode_text(window).into_owned()) };

    // Escape fragment text piecewise so only our own `<em>` tags are markup.
    let mut out = String::with_capacity(window.len() + 32);
    let mut last = 0;
    for m in re.find_iter(window) {
        out.push_str(&encode_text(&window[last..m.start()]));
        out.push_str("<em>");
        out.push_str(&encode_text(m.as_str()));
        out.push_str("</em>");
        last = m.end();
    }
    out.push_str(&encode_text(&window[last..]));
    Some(out)
}

fn floor_boundary(s: &str, mut i: usize) -> usize {
    while !s.is_char_boundary(i) { i -= 1; }
    i
}

fn ceil_boundary(s: &str, mut i: usize) -> usize {
    while !s.is_char_boundary(i) { i += 1; }
    i
}

/// Load `path` and publish it. The previous generation stays live for
/// requests that already hold it.
pub fn reload(handle: &IndexHandle, path: &FsPath) -> docsearch_core::Result<u64> {
    let index = load_index(path)?;
    Ok(handle.publish(index))
}

/// Poll the index file and republish whenever its modification time changes.
/// A failed reload keeps the current index serving.
pub fn spawn_reloader(handle: Arc<IndexHandle>, path: PathBuf, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut last_seen = modified(&path);
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let current = modified(&path);
            if current.is_none() || current == last_seen {
                continue;
            }
            last_seen = current;
            let (h, p) = (handle.clone(), path.clone());
            match tokio::task::spawn_blocking(move || reload(&h, &p)).await {
                Ok(Ok(generation)) => tracing::info!(generation, path = %path.display(), "reloaded index"),
                Ok(Err(err)) => tracing::error!(%err, path = %path.display(), "index reload failed; keeping current index"),
                Err(err) => tracing::error!(%err, "index reload task failed"),
            }
        }
    })
}

fn modified(path: &FsPath) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}
