// Process configuration, read once at startup

use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::tokenizer::Tokenizer;

pub const DEFAULT_DATABASE_PATH: &str = "transactions.db";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_STATIC_DIR: &str = "static";

#[derive(Clone)]
pub struct Config {
    secret_key: Option<String>,
    pub database_path: PathBuf,
    bind_addr: String,
    pub static_dir: PathBuf,
}

impl Config {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Self {
        // A missing .env file is fine; real deployments set the variables directly
        let _ = dotenv::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup (the environment, or a map in tests).
    ///
    /// Values are only checked by the accessor that needs them, so a bad
    /// `BIND_ADDR` does not affect commands that never listen.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Config {
            secret_key: lookup("SECRET_KEY").filter(|v| !v.is_empty()),
            database_path: non_empty("DATABASE_PATH")
                .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string())
                .into(),
            bind_addr: non_empty("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            static_dir: non_empty("STATIC_DIR")
                .unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string())
                .into(),
        }
    }

    /// Listen address for the API server
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_addr
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidBindAddress {
                value: self.bind_addr.clone(),
                reason: e.to_string(),
            })
    }

    /// Moves the secret into a tokenizer. Fails if no secret was configured.
    pub fn tokenizer(&self) -> Result<Tokenizer, ConfigError> {
        Tokenizer::from_optional(self.secret_key.clone())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secret = if self.secret_key.is_some() { "<redacted>" } else { "<unset>" };
        f.debug_struct("Config")
            .field("secret_key", &secret)
            .field("database_path", &self.database_path)
            .field("bind_addr", &self.bind_addr)
            .field("static_dir", &self.static_dir)
            .finish()
    }
}
