//! Keypair files.

use anyhow::{bail, Context, Result};
use powmesh_core::Keypair;
use std::fs;
use std::path::Path;

pub fn save_keypair(path: &Path, keypair: &Keypair) -> Result<()> {
    let key_json = serde_json::json!({
        "address": keypair.address().to_hex(),
        "public_key": keypair.public_key.to_hex(),
        "private_key": hex::encode(keypair.private_key()),
    });

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(&key_json)?)
        .with_context(|| format!("Failed to write keypair file: {}", path.display()))?;
    Ok(())
}

pub fn load_keypair(path: &Path) -> Result<Keypair> {
    if !path.exists() {
        bail!(
            "Keypair file not found: {}. Use 'powmesh init' to create one.",
            path.display()
        );
    }

    let contents = fs::read_to_string(path)?;
    let json: serde_json::Value = serde_json::from_str(&contents)?;

    let private_key_hex = json
        .get("private_key")
        .and_then(|v| v.as_str())
        .context("Missing private_key in keypair file")?;

    Keypair::from_private_hex(private_key_hex).context("Invalid private key")
}
