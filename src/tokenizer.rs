// Card tokenization - SHA-256(card number as submitted || secret), hex encoded
// Deterministic: the same card string under the same secret always maps to
// the same token, so repeat charges can be correlated in the ledger. The
// input is hashed as submitted, so "4539 1488 ..." and "45391488..." differ.

use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::ConfigError;
use crate::validator::CardNumber;

/// Length of a token in hex characters (256-bit digest)
pub const TOKEN_LEN: usize = 64;

/// Opaque, fixed-length stand-in for a card number
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix for log lines
    pub fn prefix(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Holds the process-wide tokenization secret.
///
/// Built once at startup; construction fails if the secret is missing, so
/// the server refuses to start instead of failing on the first request.
#[derive(Clone)]
pub struct Tokenizer {
    secret: String,
}

impl Tokenizer {
    pub fn new(secret: impl Into<String>) -> Result<Self, ConfigError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        Ok(Tokenizer { secret })
    }

    /// Same as `new`, for secrets read from optional configuration
    pub fn from_optional(secret: Option<String>) -> Result<Self, ConfigError> {
        Self::new(secret.ok_or(ConfigError::MissingSecret)?)
    }

    pub fn tokenize(&self, card: &CardNumber) -> Token {
        let mut hasher = Sha256::new();
        hasher.update(card.raw().as_bytes());
        hasher.update(self.secret.as_bytes());
        Token(format!("{:x}", hasher.finalize()))
    }
}

impl fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tokenizer").field("secret", &"<redacted>").finish()
    }
}
