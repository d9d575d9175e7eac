//! HTTP transport for the powmesh peer protocol.
//!
//! The server side is an axum router exposing every [`Peer`] call of a
//! [`PeerNode`], plus operator endpoints (`/mine`, `/chain`, `/blocks/:hash`). The client
//! side is [`HttpPeer`], which implements [`Peer`] on top of blocking reqwest.
//!
//! [`Peer`]: powmesh_node::Peer
//! [`PeerNode`]: powmesh_node::PeerNode

pub mod api;
pub mod client;
pub mod error;
pub mod routes;

pub use client::HttpPeer;
pub use error::{Result, ServerError};
pub use routes::{build_router, AppState};

use std::future::Future;
use tokio::net::TcpListener;

/// Serve `state` on `listener` until `shutdown` resolves.
///
/// A mining run still in progress at shutdown is cancelled so that its
/// request can complete.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tracing::info!(
        addr = %listener.local_addr()?,
        node = %state.node.local_address(),
        "listening"
    );
    let node = state.node.clone();
    let shutdown = async move {
        shutdown.await;
        node.ledger().cancel_mining();
    };
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
