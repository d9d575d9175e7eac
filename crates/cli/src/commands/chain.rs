//! Chain inspection command.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use powmesh_server::HttpPeer;
use std::time::Duration;

#[derive(Args)]
pub struct ChainArgs {
    /// Node URL
    #[arg(short, long, default_value = "http://127.0.0.1:7070")]
    node: String,

    /// Number of recent blocks to show
    #[arg(short, long, default_value = "10")]
    count: usize,
}

pub fn run(args: ChainArgs) -> Result<()> {
    let client = HttpPeer::new(args.node.clone(), Duration::from_secs(30))?;
    let chain = client
        .chain(args.count)
        .with_context(|| format!("Failed to fetch chain from {}", args.node))?;

    println!("{}", "Chain".bold().cyan());
    println!("  Node:       {} ({})", chain.address.bright_yellow(), chain.state);
    println!("  Height:     {}", chain.height.to_string().bright_cyan());
    println!("  Tip:        {}", chain.last_block_hash.bright_yellow());
    println!("  Difficulty: {}", chain.difficulty.to_string().bright_cyan());
    println!(
        "  Pending:    {}",
        chain.pending_transactions.to_string().bright_cyan()
    );
    println!("  Peers:      {}", chain.peers.len().to_string().bright_cyan());
    for peer in &chain.peers {
        println!("    - {}", peer.bright_black());
    }

    if chain.blocks.is_empty() {
        println!();
        println!("{}", "No blocks yet.".yellow());
        return Ok(());
    }

    println!();
    println!("{}", "Recent blocks".bold());
    for block in &chain.blocks {
        println!(
            "  #{:<5} {}  nonce {}  txs {}",
            block.height,
            block.hash.bright_yellow(),
            block.nonce,
            block.transactions
        );
        println!("         prev {}", block.previous_hash.bright_black());
    }

    Ok(())
}
