use crate::api::ErrorResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use powmesh_chain::LedgerError;
use powmesh_node::{NodeError, PeerError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Peer(#[from] PeerError),

    #[error(transparent)]
    Node(#[from] NodeError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;

impl ServerError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            ServerError::Peer(PeerError::InvalidPath(_)) => (StatusCode::BAD_REQUEST, "invalid_path"),
            ServerError::Peer(PeerError::Unreachable(_)) => (StatusCode::BAD_GATEWAY, "unreachable"),
            ServerError::Peer(PeerError::Rejected(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "rejected")
            }
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ServerError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ServerError::Client(_) => (StatusCode::BAD_GATEWAY, "unreachable"),
            ServerError::Peer(PeerError::Io(_))
            | ServerError::Node(_)
            | ServerError::Ledger(_)
            | ServerError::Task(_)
            | ServerError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
            kind: kind.to_string(),
        });
        (status, body).into_response()
    }
}
