//! Error type shared by the program binding and the data-access layer.

use thiserror::Error;

/// Errors surfaced by token_vesting operations.
///
/// Every variant except `WalletNotConnected` originates in the
/// remote RPC layer or in parsing caller input. Rejected transactions
/// arrive as `Rpc` or `Anchor`.
#[derive(Debug, Error)]
pub enum TokenVestingError {
    #[error("anchor client error: {0}")]
    Anchor(#[from] anchor_client::ClientError),

    #[error("rpc error: {0}")]
    Rpc(#[from] solana_client::client_error::ClientError),

    #[error("invalid public key: {0}")]
    InvalidPubkey(#[from] solana_sdk::pubkey::ParsePubkeyError),

    #[error("failed to load keypair from {path}: {message}")]
    Keypair { path: String, message: String },

    #[error("wallet not connected")]
    WalletNotConnected,
}

pub type Result<T> = std::result::Result<T, TokenVestingError>;
