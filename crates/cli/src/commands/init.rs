//! Initialize node command.

use super::keys::save_keypair;
use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use powmesh_core::Keypair;
use powmesh_node::NodeConfig;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Args)]
pub struct InitArgs {
    /// Directory to store node data
    #[arg(short, long, default_value = "./data")]
    data_dir: PathBuf,

    /// URL other peers use to reach this node (defaults to http://<listen>)
    #[arg(short, long)]
    address: Option<String>,

    /// Socket address the node listens on
    #[arg(short, long, default_value = "127.0.0.1:7070")]
    listen: SocketAddr,

    /// Leading zero hex characters required of a block hash
    #[arg(long, default_value = "4")]
    difficulty: u32,

    /// Mining threads (defaults to the number of CPUs)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Peer URLs to join on startup
    #[arg(short, long)]
    bootstrap: Vec<String>,
}

pub fn run(args: InitArgs) -> Result<()> {
    println!("{}", "Initializing powmesh node...".bold().cyan());
    println!();

    let config_file = args.data_dir.join("config.json");
    if config_file.exists() {
        bail!(
            "Node already initialized: {} exists",
            config_file.display()
        );
    }

    let defaults = NodeConfig::default();
    let config = NodeConfig {
        address: args
            .address
            .unwrap_or_else(|| format!("http://{}", args.listen)),
        listen: args.listen,
        accounts_dir: args.data_dir.join("accounts"),
        data_dir: args.data_dir.clone(),
        difficulty: args.difficulty,
        workers: args.workers.unwrap_or(defaults.workers),
        bootstrap: args.bootstrap,
        request_timeout_secs: defaults.request_timeout_secs,
    };
    config.validate().context("Invalid configuration")?;

    // Create data directories
    fs::create_dir_all(&config.accounts_dir).with_context(|| {
        format!("Failed to create data directory: {:?}", config.data_dir)
    })?;
    println!("{}  Created data directory", "✓".green().bold());

    // Generate node identity
    let keypair = Keypair::generate();
    let key_file = config.keys_dir().join("identity.json");
    save_keypair(&key_file, &keypair)?;
    println!(
        "{}  Generated identity {}",
        "✓".green().bold(),
        keypair.address().to_hex().bright_yellow()
    );
    println!(
        "    Saved to: {}",
        key_file.display().to_string().bright_black()
    );

    // Save config
    config.save(&config_file)?;
    println!(
        "{}  Saved config to: {}",
        "✓".green().bold(),
        config_file.display().to_string().bright_black()
    );
    println!("    Address:    {}", config.address.bright_cyan());
    println!("    Difficulty: {}", config.difficulty.to_string().bright_cyan());

    println!();
    println!("{}", "Node initialized successfully!".green().bold());
    println!();
    println!("Next steps:");
    println!(
        "  • Use {} to start the node",
        format!("powmesh node --config {}", config_file.display()).bright_cyan()
    );
    println!(
        "  • Use {} to submit records",
        "powmesh tx send".bright_cyan()
    );
    println!("  • Use {} to mine them", "powmesh mine".bright_cyan());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::keys::load_keypair;

    fn args(data_dir: PathBuf) -> InitArgs {
        InitArgs {
            data_dir,
            address: None,
            listen: "127.0.0.1:7171".parse().unwrap(),
            difficulty: 2,
            workers: Some(1),
            bootstrap: vec!["http://127.0.0.1:7070".into()],
        }
    }

    #[test]
    fn test_init_writes_config_and_identity() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("node");

        run(args(data_dir.clone())).unwrap();

        let config = NodeConfig::load(&data_dir.join("config.json")).unwrap();
        assert_eq!(config.address, "http://127.0.0.1:7171");
        assert_eq!(config.difficulty, 2);
        assert_eq!(config.bootstrap, vec!["http://127.0.0.1:7070".to_string()]);
        assert!(config.accounts_dir.is_dir());
        assert!(load_keypair(&data_dir.join("keys/identity.json")).is_ok());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        run(args(dir.path().to_path_buf())).unwrap();
        assert!(run(args(dir.path().to_path_buf())).is_err());
    }

    #[test]
    fn test_init_rejects_impossible_difficulty() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args(dir.path().to_path_buf());
        args.difficulty = 65;

        assert!(run(args).is_err());
        assert!(!dir.path().join("config.json").exists());
    }
}
