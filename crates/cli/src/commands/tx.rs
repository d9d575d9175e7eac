//! Transaction command.

use super::keys::load_keypair;
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use powmesh_core::Transaction;
use powmesh_server::HttpPeer;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Args)]
pub struct TxArgs {
    #[command(subcommand)]
    command: TxCommand,
}

#[derive(Subcommand)]
enum TxCommand {
    /// Sign a record and submit it to a node
    Send {
        /// Node URL
        #[arg(short, long, default_value = "http://127.0.0.1:7070")]
        node: String,

        /// Keypair file to sign with
        #[arg(short, long, default_value = "./data/keys/identity.json")]
        key: PathBuf,

        /// Record content
        content: String,
    },
}

pub fn run(args: TxArgs) -> Result<()> {
    match args.command {
        TxCommand::Send { node, key, content } => send(node, key, content),
    }
}

fn send(node: String, key: PathBuf, content: String) -> Result<()> {
    let keypair = load_keypair(&key)?;
    let tx = Transaction::signed(content, &keypair);

    let client = HttpPeer::new(node.clone(), Duration::from_secs(30))?;
    let resp = client
        .submit_signed(tx, &keypair.public_key)
        .with_context(|| format!("Failed to submit transaction to {}", node))?;

    if resp.added {
        println!("{}  Transaction submitted", "✓".green().bold());
    } else {
        println!("{}  Transaction already pending", "•".yellow().bold());
    }
    println!("    Author: {}", keypair.address().to_hex().bright_yellow());
    println!("    Hash:   {}", resp.hash.bright_black());

    Ok(())
}
