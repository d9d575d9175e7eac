//! Mine command.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use powmesh_server::HttpPeer;
use std::time::Duration;

#[derive(Args)]
pub struct MineArgs {
    /// Node URL
    #[arg(short, long, default_value = "http://127.0.0.1:7070")]
    node: String,

    /// Seconds to wait for the node to find a nonce
    #[arg(short, long, default_value = "600")]
    timeout: u64,
}

pub fn run(args: MineArgs) -> Result<()> {
    let client = HttpPeer::new(args.node.clone(), Duration::from_secs(args.timeout))?;

    println!("{}", "Mining pending transactions...".bold().cyan());
    let resp = client
        .mine()
        .with_context(|| format!("Failed to mine on {}", args.node))?;

    match resp.block {
        Some(block) => {
            println!("{}  Mined block #{}", "✓".green().bold(), block.height);
            println!("    Hash:         {}", block.hash.bright_yellow());
            println!("    Nonce:        {}", block.nonce.to_string().bright_cyan());
            println!(
                "    Transactions: {}",
                block.transactions.to_string().bright_cyan()
            );
        }
        None => println!("{}  Nothing pending to mine", "•".yellow().bold()),
    }

    Ok(())
}
