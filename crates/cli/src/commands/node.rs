//! Run a node.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use powmesh_node::{NodeConfig, PeerNode};
use powmesh_server::{serve, AppState, HttpPeer};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Args)]
pub struct NodeArgs {
    /// Path to the node's config file
    #[arg(short, long, default_value = "./data/config.json")]
    config: PathBuf,
}

pub fn run(args: NodeArgs) -> Result<()> {
    let config = NodeConfig::load(&args.config)
        .with_context(|| format!("Failed to load config: {}", args.config.display()))?;
    let node = PeerNode::open(&config).context("Failed to open node")?;

    let stats = node.ledger().stats();
    println!("{}", "Starting powmesh node...".bold().cyan());
    println!("  Address:    {}", config.address.bright_yellow());
    println!("  Listen:     {}", config.listen.to_string().bright_cyan());
    println!("  Height:     {}", stats.height.to_string().bright_cyan());
    println!("  Difficulty: {}", stats.difficulty.to_string().bright_cyan());

    // Bootstrap joins make blocking peer calls and run on this thread,
    // outside the runtime.
    let runtime = tokio::runtime::Runtime::new()?;
    let listener = runtime
        .block_on(TcpListener::bind(config.listen))
        .with_context(|| format!("Failed to bind {}", config.listen))?;

    let state = AppState::new(node.clone(), config.request_timeout());
    let server = runtime.spawn(serve(listener, state, shutdown_signal()));

    for url in &config.bootstrap {
        let peer = HttpPeer::new(url.clone(), config.request_timeout())?;
        match node.join(Arc::new(peer)) {
            Ok(()) => println!("{}  Joined mesh via {}", "✓".green().bold(), url.bright_cyan()),
            Err(e) => println!("{}  Could not join via {}: {}", "✗".red().bold(), url, e),
        }
    }

    println!();
    println!("{}", "Node running. Press Ctrl+C to stop.".green().bold());

    runtime
        .block_on(server)
        .context("Server task panicked")?
        .context("Server failed")?;

    println!("{}", "Node stopped.".bold());
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
