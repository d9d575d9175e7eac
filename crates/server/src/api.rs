//! Request and response bodies.

use powmesh_core::{Block, Transaction};
use powmesh_node::NodeState;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct AddressResponse {
    pub address: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddPeerRequest {
    pub address: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PeersResponse {
    pub peers: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitTransactionRequest {
    pub transaction: Transaction,
    /// Hex public key of the author. When present the signature is checked
    /// before the transaction is accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitTransactionResponse {
    /// False when the transaction was already pending.
    pub added: bool,
    pub hash: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionsResponse {
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RemoveTransactionRequest {
    pub transaction: Transaction,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateDirectoryRequest {
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReceiveFileRequest {
    pub path: String,
    /// File content, hex encoded.
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSummary {
    pub height: usize,
    pub hash: String,
    pub previous_hash: String,
    pub merkle_root: String,
    pub nonce: u64,
    pub transactions: usize,
}

impl BlockSummary {
    pub fn new(height: usize, block: &Block) -> Self {
        Self {
            height,
            hash: block.hash().map(|h| h.to_hex()).unwrap_or_default(),
            previous_hash: block.previous_hash().to_hex(),
            merkle_root: block.merkle_root().to_hex(),
            nonce: block.nonce(),
            transactions: block.transactions().len(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MineResponse {
    /// None when nothing was pending.
    pub block: Option<BlockSummary>,
}

/// Query of `GET /chain`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ChainQuery {
    /// How many of the most recent blocks to include.
    pub count: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChainResponse {
    pub address: String,
    pub state: NodeState,
    pub height: usize,
    pub last_block_hash: String,
    pub difficulty: u32,
    pub pending_transactions: usize,
    pub peers: Vec<String>,
    /// Most recent first.
    pub blocks: Vec<BlockSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
}
