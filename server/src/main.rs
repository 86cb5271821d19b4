use anyhow::Result;
use axum::Router;
use clap::Parser;
use docsearch_core::persist::IndexPaths;
use docsearch_core::ScoringConfig;
use server::{build_app, load_handle, spawn_reloader, ServeConfig};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Index directory path
    #[arg(long, default_value = "./index")]
    index: String,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Multiplier for matches inside fragment titles
    #[arg(long, default_value_t = docsearch_core::query::DEFAULT_TITLE_BOOST)]
    title_boost: f32,
    /// Largest page size a client may request
    #[arg(long, default_value_t = 100)]
    max_limit: usize,
    /// Seconds between checks for a rebuilt index file (0 disables reloading)
    #[arg(long, default_value_t = 0)]
    reload_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let index_path = IndexPaths::new(&args.index).index();
    let handle = match load_handle(&index_path) {
        Ok(handle) => handle,
        Err(err) if err.is_format_error() => {
            tracing::error!(%err, path = %index_path.display(), "refusing to serve an unreadable index; rebuild it with this version of the indexer");
            return Err(err.into());
        }
        Err(err) => return Err(err.into()),
    };
    let config = ServeConfig { scoring: ScoringConfig { title_boost: args.title_boost }, max_limit: args.max_limit };
    let app: Router = build_app(handle.clone(), config)?;

    if args.reload_secs > 0 {
        spawn_reloader(handle, index_path, Duration::from_secs(args.reload_secs));
    }

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
