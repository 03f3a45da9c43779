//! The node binary: loads config, boots the façade, serves the HTTP API.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use zedovium_node::config::Config;
use zedovium_node::http;
use zedovium_node::node::Node;

#[derive(Parser, Debug)]
#[command(name = "zedovium-node", about = "Proof-of-work node: chain, mempool, balances, difficulty")]
struct Args {
    /// TOML config file. Falls back to built-in defaults when absent.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides `data_dir` from the config file.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Overrides `http.listen_addr` from the config file.
    #[arg(long)]
    listen_addr: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::load_or_default(args.config.as_ref())?;
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(listen_addr) = args.listen_addr {
        config.http.listen_addr = listen_addr;
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!(data_dir = %config.data_dir.display(), "loading chain");
    let node = Arc::new(Node::new(config.clone())?);

    let app = http::router(node).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.http.listen_addr).await?;
    tracing::info!(addr = %config.http.listen_addr, "listening");

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown requested");
        }
    }

    Ok(())
}
