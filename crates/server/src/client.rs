//! Blocking HTTP client for a remote node.
//!
//! [`HttpPeer`] implements [`Peer`] so the protocol can reach nodes over the
//! network. It uses the blocking reqwest client and must therefore never be
//! created, called or dropped on an async executor thread.

use crate::api::{
    AddPeerRequest, AddressResponse, BlockSummary, ChainResponse, CreateDirectoryRequest, ErrorResponse,
    MineResponse, PeersResponse, ReceiveFileRequest, RemoveTransactionRequest,
    SubmitTransactionRequest, SubmitTransactionResponse, TransactionsResponse,
};
use powmesh_core::{PublicKey, Transaction};
use powmesh_node::peer::Result as PeerResult;
use powmesh_node::{Peer, PeerError};
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpPeer {
    base_url: String,
    timeout: Duration,
    client: Client,
}

impl HttpPeer {
    pub fn new(url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let url = url.into();
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: url.trim_end_matches('/').to_string(),
            timeout,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn unreachable(&self, err: reqwest::Error) -> PeerError {
        tracing::debug!(peer = %self.base_url, error = %err, "request failed");
        PeerError::Unreachable(self.base_url.clone())
    }

    fn check(&self, resp: Response) -> PeerResult<Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        match resp.json::<ErrorResponse>() {
            Ok(body) if body.kind == "invalid_path" => Err(PeerError::InvalidPath(body.error)),
            Ok(body) => Err(PeerError::Rejected(body.error)),
            Err(_) => Err(PeerError::Rejected(format!("{} returned {}", self.base_url, status))),
        }
    }

    fn get<R: DeserializeOwned>(&self, path: &str) -> PeerResult<R> {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .map_err(|e| self.unreachable(e))?;
        self.check(resp)?.json().map_err(|e| self.unreachable(e))
    }

    fn post<B: Serialize>(&self, path: &str, body: &B) -> PeerResult<Response> {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .map_err(|e| self.unreachable(e))?;
        self.check(resp)
    }

    /// Submit a transaction, having the node verify it against `public_key`.
    pub fn submit_signed(
        &self,
        tx: Transaction,
        public_key: &PublicKey,
    ) -> PeerResult<SubmitTransactionResponse> {
        let request = SubmitTransactionRequest {
            transaction: tx,
            public_key: Some(public_key.to_hex()),
        };
        self.post("/transactions", &request)?
            .json()
            .map_err(|e| self.unreachable(e))
    }

    /// Ask the node to mine its pending set.
    pub fn mine(&self) -> PeerResult<MineResponse> {
        self.post("/mine", &())?.json().map_err(|e| self.unreachable(e))
    }

    /// Chain summary with the `count` most recent blocks.
    pub fn chain(&self, count: usize) -> PeerResult<ChainResponse> {
        self.get(&format!("/chain?count={count}"))
    }

    /// Look up a block by hash; `None` when the node does not have it.
    pub fn block(&self, hash: &str) -> PeerResult<Option<BlockSummary>> {
        let resp = self
            .client
            .get(self.url(&format!("/blocks/{hash}")))
            .send()
            .map_err(|e| self.unreachable(e))?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        self.check(resp)?.json().map(Some).map_err(|e| self.unreachable(e))
    }
}

impl Peer for HttpPeer {
    fn address(&self) -> PeerResult<String> {
        let resp: AddressResponse = self.get("/address")?;
        Ok(resp.address)
    }

    fn add_peer(&self, peer: Arc<dyn Peer>) -> PeerResult<()> {
        let address = peer.address()?;
        self.post("/peers", &AddPeerRequest { address })?;
        Ok(())
    }

    fn list_peers(&self) -> PeerResult<Vec<Arc<dyn Peer>>> {
        let resp: PeersResponse = self.get("/peers")?;
        resp.peers
            .into_iter()
            .map(|address| {
                HttpPeer::new(address, self.timeout)
                    .map(|peer| Arc::new(peer) as Arc<dyn Peer>)
                    .map_err(|e| self.unreachable(e))
            })
            .collect()
    }

    fn add_transaction(&self, tx: Transaction) -> PeerResult<()> {
        let request = SubmitTransactionRequest {
            transaction: tx,
            public_key: None,
        };
        self.post("/transactions", &request)?;
        Ok(())
    }

    fn list_transactions(&self) -> PeerResult<HashSet<Transaction>> {
        let resp: TransactionsResponse = self.get("/transactions")?;
        Ok(resp.transactions.into_iter().collect())
    }

    fn remove_transaction(&self, tx: &Transaction) -> PeerResult<()> {
        let request = RemoveTransactionRequest {
            transaction: tx.clone(),
        };
        self.post("/transactions/remove", &request)?;
        Ok(())
    }

    fn create_directory(&self, path: &str) -> PeerResult<()> {
        let request = CreateDirectoryRequest {
            path: path.to_string(),
        };
        self.post("/accounts/directories", &request)?;
        Ok(())
    }

    fn receive_file(&self, path: &str, content: &[u8]) -> PeerResult<()> {
        let request = ReceiveFileRequest {
            path: path.to_string(),
            content: hex::encode(content),
        };
        self.post("/accounts/files", &request)?;
        Ok(())
    }
}
