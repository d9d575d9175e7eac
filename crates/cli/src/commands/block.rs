//! Block lookup command.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use powmesh_server::HttpPeer;
use std::time::Duration;

#[derive(Args)]
pub struct BlockArgs {
    /// Node URL
    #[arg(short, long, default_value = "http://127.0.0.1:7070")]
    node: String,

    /// Block hash (hex)
    hash: String,
}

pub fn run(args: BlockArgs) -> Result<()> {
    let client = HttpPeer::new(args.node.clone(), Duration::from_secs(30))?;
    let Some(block) = client
        .block(&args.hash)
        .with_context(|| format!("Failed to fetch block from {}", args.node))?
    else {
        bail!("Block {} not found on {}", args.hash, args.node);
    };

    println!("{}", format!("Block #{}", block.height).bold().cyan());
    println!("  Hash:         {}", block.hash.bright_yellow());
    println!("  Previous:     {}", block.previous_hash.bright_black());
    println!("  Merkle root:  {}", block.merkle_root.bright_black());
    println!("  Nonce:        {}", block.nonce.to_string().bright_cyan());
    println!(
        "  Transactions: {}",
        block.transactions.to_string().bright_cyan()
    );

    Ok(())
}
