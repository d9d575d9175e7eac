//! Signed records: the payloads the ledger commits to.

use crate::crypto::{Address, Keypair, PublicKey, Signature};
use crate::hash::{hash, Hash};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur while checking a transaction.
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("public key does not belong to author {0}")]
    AuthorMismatch(Address),
    #[error("signature verification failed")]
    VerificationFailed,
}

/// A signed record submitted to the ledger.
///
/// Equality is by value, which is what keeps the pending set and gossip
/// deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transaction {
    /// Address of the signing key.
    pub author: Address,
    /// Opaque record body.
    pub content: String,
    /// Signature over [`Transaction::signing_message`].
    pub signature: Signature,
}

impl Transaction {
    /// Create an unsigned transaction.
    pub fn new(author: Address, content: impl Into<String>) -> Self {
        Self {
            author,
            content: content.into(),
            signature: Signature::default(),
        }
    }

    /// Create and sign a transaction in one step.
    pub fn signed(content: impl Into<String>, keypair: &Keypair) -> Self {
        let mut tx = Self::new(keypair.address(), content);
        tx.sign(keypair);
        tx
    }

    /// The bytes covered by the signature.
    pub fn signing_message(&self) -> String {
        format!("{}:{}", self.author.to_hex(), self.content)
    }

    pub fn sign(&mut self, keypair: &Keypair) {
        self.author = keypair.address();
        self.signature = keypair.sign(self.signing_message().as_bytes());
    }

    /// Check that `public_key` owns the author address and signed this record.
    pub fn verify(&self, public_key: &PublicKey) -> Result<(), TransactionError> {
        if public_key.to_address() != self.author {
            return Err(TransactionError::AuthorMismatch(self.author));
        }
        public_key
            .verify(self.signing_message().as_bytes(), &self.signature)
            .map_err(|_| TransactionError::VerificationFailed)
    }

    /// Digest of the canonical string form; this is the merkle leaf.
    pub fn hash(&self) -> Hash {
        hash(self.to_string().as_bytes())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.author, self.content, self.signature)
    }
}
