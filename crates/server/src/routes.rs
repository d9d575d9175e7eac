//! HTTP routes.
//!
//! Every protocol call may itself call other peers through the blocking
//! client, so handlers hand the work to the blocking thread pool.

use crate::api::*;
use crate::client::HttpPeer;
use crate::error::{Result, ServerError};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use powmesh_consensus::TransactionValidator;
use powmesh_core::{Hash, PublicKey};
use powmesh_node::{Peer, PeerNode};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

/// Shared state of the router.
#[derive(Clone)]
pub struct AppState {
    pub node: Arc<PeerNode>,
    /// Timeout for clients created towards newly announced peers.
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(node: Arc<PeerNode>, request_timeout: Duration) -> Self {
        Self {
            node,
            request_timeout,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/address", get(address))
        .route("/peers", get(list_peers).post(add_peer))
        .route("/transactions", get(list_transactions).post(add_transaction))
        .route("/transactions/remove", post(remove_transaction))
        .route("/accounts/directories", post(create_directory))
        .route("/accounts/files", post(receive_file))
        .route("/mine", post(mine))
        .route("/chain", get(chain))
        .route("/blocks/:hash", get(block_by_hash))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn blocking<F, T>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await?
}

async fn address(State(state): State<AppState>) -> Json<AddressResponse> {
    Json(AddressResponse {
        address: state.node.local_address().to_string(),
    })
}

async fn list_peers(State(state): State<AppState>) -> Json<PeersResponse> {
    Json(PeersResponse {
        peers: state.node.peer_addresses(),
    })
}

async fn add_peer(
    State(state): State<AppState>,
    Json(req): Json<AddPeerRequest>,
) -> Result<Json<PeersResponse>> {
    blocking(move || {
        let peer = HttpPeer::new(req.address, state.request_timeout)?;
        state.node.add_peer(Arc::new(peer))?;
        Ok(Json(PeersResponse {
            peers: state.node.peer_addresses(),
        }))
    })
    .await
}

async fn list_transactions(State(state): State<AppState>) -> Json<TransactionsResponse> {
    Json(TransactionsResponse {
        transactions: state.node.ledger().pending().snapshot(),
    })
}

async fn add_transaction(
    State(state): State<AppState>,
    Json(req): Json<SubmitTransactionRequest>,
) -> Result<Json<SubmitTransactionResponse>> {
    let tx = req.transaction;

    if let Some(key) = req.public_key {
        let public_key = PublicKey::from_hex(&key)
            .map_err(|e| ServerError::BadRequest(format!("public key: {e}")))?;
        TransactionValidator::validate_with_signature(&tx, &public_key)
            .map_err(|e| ServerError::BadRequest(e.to_string()))?;
    }

    blocking(move || {
        let hash = tx.hash().to_hex();
        let added = state.node.submit_transaction(tx);
        Ok(Json(SubmitTransactionResponse { added, hash }))
    })
    .await
}

async fn remove_transaction(
    State(state): State<AppState>,
    Json(req): Json<RemoveTransactionRequest>,
) -> Result<()> {
    state.node.remove_transaction(&req.transaction)?;
    Ok(())
}

async fn create_directory(
    State(state): State<AppState>,
    Json(req): Json<CreateDirectoryRequest>,
) -> Result<()> {
    blocking(move || Ok(state.node.create_directory(&req.path)?)).await
}

async fn receive_file(
    State(state): State<AppState>,
    Json(req): Json<ReceiveFileRequest>,
) -> Result<()> {
    let content = hex::decode(&req.content)
        .map_err(|e| ServerError::BadRequest(format!("content: {e}")))?;
    blocking(move || Ok(state.node.receive_file(&req.path, &content)?)).await
}

async fn mine(State(state): State<AppState>) -> Result<Json<MineResponse>> {
    blocking(move || {
        let block = state.node.mine_pending()?;
        let height = state.node.ledger().height();
        Ok(Json(MineResponse {
            block: block.map(|b| BlockSummary::new(height.saturating_sub(1), &b)),
        }))
    })
    .await
}

/// Blocks listed by `GET /chain` when no count is given.
const DEFAULT_CHAIN_COUNT: usize = 10;

async fn chain(
    State(state): State<AppState>,
    Query(query): Query<ChainQuery>,
) -> Result<Json<ChainResponse>> {
    let count = query.count.unwrap_or(DEFAULT_CHAIN_COUNT);
    blocking(move || {
        let node = &state.node;
        let ledger = node.ledger();
        let stats = ledger.stats();
        let blocks = ledger
            .recent_blocks(count)?
            .iter()
            .map(|(height, block)| BlockSummary::new(*height, block))
            .collect();

        Ok(Json(ChainResponse {
            address: node.local_address().to_string(),
            state: node.state(),
            height: stats.height,
            last_block_hash: stats.last_block_hash.to_hex(),
            difficulty: stats.difficulty,
            pending_transactions: stats.pending_transactions,
            peers: node.peer_addresses(),
            blocks,
        }))
    })
    .await
}

async fn block_by_hash(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<Json<BlockSummary>> {
    let parsed =
        Hash::from_hex(&hash).map_err(|e| ServerError::BadRequest(format!("block hash: {e}")))?;
    blocking(move || match state.node.ledger().block_by_hash(&parsed)? {
        Some((height, block)) => Ok(Json(BlockSummary::new(height, &block))),
        None => Err(ServerError::NotFound(format!("block {hash}"))),
    })
    .await
}
