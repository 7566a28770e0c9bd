use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::repository::RepositoryError;

#[derive(Debug, Clone, Error, JsonSchema, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum ServiceError {
    // Business validation errors
    /// The provided account, token or contract address is invalid or malformed.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// The token was not found in the configured token list.
    #[error("Token not found or not supported: {0}")]
    TokenNotFound(String),

    /// The requested amount is invalid (e.g., negative or malformed).
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// The factory has no pool for the requested token pair.
    #[error("Liquidity pool not found for pair {token0}/{token1}")]
    LiquidityPoolNotFound { token0: String, token1: String },

    /// The pool does not have the two-token layout this client supports.
    #[error("Unsupported pool {pool}: {reason}")]
    UnsupportedPool { pool: String, reason: String },

    /// The route cannot be executed by the requested operation.
    #[error("Invalid route: {0}")]
    InvalidRoute(String),

    /// A required contract address is missing from the chain configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A state-changing transaction could not be sent or was reverted.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    // Infrastructure errors (abstracted from repository layer)
    /// An error occurred while communicating with the blockchain.
    #[error("Blockchain connection error: {0}")]
    BlockchainError(String),

    /// An unexpected internal error occurred.
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::RpcError(msg)
            | RepositoryError::NetworkError(msg)
            | RepositoryError::ContractError(msg) => {
                ServiceError::BlockchainError(format!("Failed to interact with blockchain: {msg}"))
            }
            RepositoryError::Reverted(tx_hash) => {
                ServiceError::TransactionFailed(format!("transaction {tx_hash} reverted"))
            }
            RepositoryError::ParseError(msg) => ServiceError::InvalidAddress(msg),
            RepositoryError::Other(msg) => ServiceError::InternalError(msg),
        }
    }
}
