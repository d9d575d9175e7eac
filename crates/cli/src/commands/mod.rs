//! CLI commands module.

use anyhow::Result;
use clap::Subcommand;

mod block;
mod chain;
mod init;
mod keys;
mod mine;
mod node;
mod tx;

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a node's data directory
    Init(init::InitArgs),
    /// Run a node
    Node(node::NodeArgs),
    /// Transaction operations
    Tx(tx::TxArgs),
    /// Mine the pending transactions of a node
    Mine(mine::MineArgs),
    /// Show a node's chain
    Chain(chain::ChainArgs),
    /// Look up a block by hash
    Block(block::BlockArgs),
}

pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Init(args) => init::run(args),
        Commands::Node(args) => node::run(args),
        Commands::Tx(args) => tx::run(args),
        Commands::Mine(args) => mine::run(args),
        Commands::Chain(args) => chain::run(args),
        Commands::Block(args) => block::run(args),
    }
}
