// Error taxonomy for the payment intake pipeline
//
// ValidationError  -> client input, 4xx, nothing persisted
// ConfigError      -> startup only, aborts the process
// PersistenceError -> ledger insert failed, 5xx for that request only
//
// A processor decline is NOT an error (see authorizer::Decision).

use thiserror::Error;

/// Why a payment request was rejected before tokenization.
///
/// The `Display` text is the human-readable reason returned to the client.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid card number")]
    InvalidCardNumber,

    #[error("Invalid expiry date")]
    InvalidExpiry,

    #[error("Invalid CVV")]
    InvalidCvv,

    #[error("Invalid amount")]
    InvalidAmount,
}

/// Fatal startup conditions. Never produced while serving a request.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The message never includes the secret value itself.
    #[error("SECRET_KEY environment variable not set")]
    MissingSecret,

    #[error("Invalid bind address {value:?}: {reason}")]
    InvalidBindAddress { value: String, reason: String },
}

/// The ledger could not record a transaction.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Ledger connection unavailable")]
    LedgerUnavailable,
}
