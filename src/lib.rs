// Payment Intake - Core Library
// Validation, tokenization, authorization and ledger recording for card
// payments. Shared by the CLI, the API server and the tests.

pub mod authorizer;
pub mod config;
pub mod db;
pub mod error;
pub mod pipeline;
pub mod request;
pub mod tokenizer;
pub mod validator;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use authorizer::{Authorizer, AuthorizerBox, DeclineReason, Decision, SimulatedAuthorizer};
pub use config::Config;
pub use db::{
    Ledger, LedgerBox, SqliteLedger, Transaction, TransactionId, TransactionStatus,
    SENTINEL_TRANSACTION_ID,
    setup_database, insert_transaction, verify_count, get_all_transactions,
};
pub use error::{ConfigError, PersistenceError, ValidationError};
pub use pipeline::{OutcomeClass, PaymentOutcome, PaymentPipeline, PaymentReceipt, Stage};
pub use request::{PaymentRequest, PaymentResponse};
pub use tokenizer::{Token, Tokenizer, TOKEN_LEN};
pub use validator::{
    CardNumber, Expiry, ValidatedPayment,
    validate, validate_card_number, validate_expiry, validate_cvv, validate_amount, luhn_valid,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
