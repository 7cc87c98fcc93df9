// Ledger - append-only transaction store on SQLite
// One row per recorded payment outcome; rows are never updated or deleted.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use crate::authorizer::Decision;
use crate::error::PersistenceError;
use crate::tokenizer::Token;
use crate::validator::AMOUNT_SCALE;

/// Identifier assigned by the ledger on insert
pub type TransactionId = i64;

/// Reported when nothing was recorded
pub const SENTINEL_TRANSACTION_ID: TransactionId = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Success,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Success => "success",
            TransactionStatus::Failed => "failed",
        }
    }
}

impl From<Decision> for TransactionStatus {
    fn from(decision: Decision) -> Self {
        if decision.is_approved() {
            TransactionStatus::Success
        } else {
            TransactionStatus::Failed
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "success" => Ok(TransactionStatus::Success),
            "failed" => Ok(TransactionStatus::Failed),
            other => Err(format!("unknown transaction status {:?}", other)),
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded payment outcome. Immutable once written.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: TransactionId,
    pub token: String,
    pub amount: Decimal,
    pub status: TransactionStatus,
    /// Assigned at insert time
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// LEDGER PORT
// ============================================================================

/// Persistence boundary: insert one row, get its identifier back.
pub trait Ledger: Send + Sync {
    fn record(
        &self,
        token: &Token,
        amount: Decimal,
        status: TransactionStatus,
    ) -> std::result::Result<TransactionId, PersistenceError>;
}

pub type LedgerBox = Box<dyn Ledger>;

/// SQLite-backed ledger sharing one connection behind a mutex
#[derive(Clone)]
pub struct SqliteLedger {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLedger {
    /// Open (or create) the ledger file and make sure the schema exists
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open ledger database {:?}", path))?;
        Self::new(conn)
    }

    pub fn new(conn: Connection) -> Result<Self> {
        setup_database(&conn)?;
        Ok(SqliteLedger {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Shared handle, for inspection helpers
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }
}

impl Ledger for SqliteLedger {
    fn record(
        &self,
        token: &Token,
        amount: Decimal,
        status: TransactionStatus,
    ) -> std::result::Result<TransactionId, PersistenceError> {
        let conn = self.conn.lock().map_err(|_| PersistenceError::LedgerUnavailable)?;
        let id = insert_transaction(&conn, token.as_str(), amount, status, Utc::now())?;
        Ok(id)
    }
}

// ============================================================================
// SCHEMA & QUERIES
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")
        .context("Failed to enable WAL journal mode")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            token TEXT NOT NULL CHECK(length(token) <= 64),
            amount TEXT NOT NULL,
            status TEXT NOT NULL CHECK(status IN ('success', 'failed')),
            created_at TEXT NOT NULL
        )",
        [],
    )
    .context("Failed to create transactions table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_transactions_token ON transactions(token)",
        [],
    )
    .context("Failed to create token index")?;

    Ok(())
}

/// Single atomic insert; returns the assigned id
pub fn insert_transaction(
    conn: &Connection,
    token: &str,
    amount: Decimal,
    status: TransactionStatus,
    created_at: DateTime<Utc>,
) -> rusqlite::Result<TransactionId> {
    let mut amount = amount;
    amount.rescale(AMOUNT_SCALE);

    conn.query_row(
        "INSERT INTO transactions (token, amount, status, created_at)
         VALUES (?1, ?2, ?3, ?4)
         RETURNING id",
        params![token, amount.to_string(), status.as_str(), created_at.to_rfc3339()],
        |row| row.get(0),
    )
}

pub fn verify_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;

    Ok(count)
}

/// All rows in id order. Inspection only; the payment path never reads.
pub fn get_all_transactions(conn: &Connection) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(
        "SELECT id, token, amount, status, created_at
         FROM transactions
         ORDER BY id",
    )?;

    let transactions = stmt
        .query_map([], |row| {
            let amount_str: String = row.get(2)?;
            let status_str: String = row.get(3)?;
            let created_at_str: String = row.get(4)?;

            let amount = Decimal::from_str(&amount_str)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;
            let status = TransactionStatus::from_str(&status_str)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, e.into()))?;
            let created_at = DateTime::parse_from_rfc3339(&created_at_str)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?
                .with_timezone(&Utc);

            Ok(Transaction {
                id: row.get(0)?,
                token: row.get(1)?,
                amount,
                status,
                created_at,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(transactions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authorizer::DeclineReason;
    use crate::tokenizer::Tokenizer;
    use crate::validator::validate_card_number;
    use rust_decimal_macros::dec;

    fn test_token() -> Token {
        let card = validate_card_number("4539148803436467").unwrap();
        Tokenizer::new("test-secret").unwrap().tokenize(&card)
    }

    fn memory_ledger() -> SqliteLedger {
        SqliteLedger::new(Connection::open_in_memory().unwrap()).unwrap()
    }

    #[test]
    fn test_record_returns_increasing_ids() {
        let ledger = memory_ledger();
        let token = test_token();

        let first = ledger.record(&token, dec!(10.00), TransactionStatus::Success).unwrap();
        let second = ledger.record(&token, dec!(20.00), TransactionStatus::Failed).unwrap();

        assert!(first > SENTINEL_TRANSACTION_ID);
        assert!(second > first);

        let conn = ledger.connection();
        let conn = conn.lock().unwrap();
        assert_eq!(verify_count(&conn).unwrap(), 2);
    }

    #[test]
    fn test_recorded_row_shape() {
        let ledger = memory_ledger();
        let token = test_token();
        let before = Utc::now();

        let id = ledger.record(&token, dec!(100), TransactionStatus::Success).unwrap();

        let conn = ledger.connection();
        let conn = conn.lock().unwrap();
        let rows = get_all_transactions(&conn).unwrap();
        assert_eq!(rows.len(), 1);

        let row = &rows[0];
        assert_eq!(row.id, id);
        assert_eq!(row.token, token.as_str());
        assert_eq!(row.amount, dec!(100.00));
        assert_eq!(row.status, TransactionStatus::Success);
        assert!(row.created_at >= before - chrono::Duration::seconds(1));

        let stored_amount: String = conn
            .query_row("SELECT amount FROM transactions WHERE id = ?1", [id], |r| r.get(0))
            .unwrap();
        assert_eq!(stored_amount, "100.00");
    }

    #[test]
    fn test_insert_failure_leaves_no_row() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn.execute_batch(
            "CREATE TRIGGER reject_inserts BEFORE INSERT ON transactions
             BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
        )
        .unwrap();

        let ledger = SqliteLedger::new(conn).unwrap();
        let result = ledger.record(&test_token(), dec!(5.00), TransactionStatus::Success);

        assert!(matches!(result, Err(PersistenceError::Database(_))));

        let conn = ledger.connection();
        let conn = conn.lock().unwrap();
        assert_eq!(verify_count(&conn).unwrap(), 0);
    }

    #[test]
    fn test_schema_rejects_oversized_token() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let long_token = "a".repeat(65);
        let result = insert_transaction(&conn, &long_token, dec!(1.00), TransactionStatus::Success, Utc::now());

        assert!(result.is_err());
        assert_eq!(verify_count(&conn).unwrap(), 0);
    }

    #[test]
    fn test_setup_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        insert_transaction(&conn, "abc", dec!(1.50), TransactionStatus::Failed, Utc::now()).unwrap();
        setup_database(&conn).unwrap();

        assert_eq!(verify_count(&conn).unwrap(), 1);
    }

    #[test]
    fn test_status_from_decision() {
        assert_eq!(TransactionStatus::from(Decision::Approved), TransactionStatus::Success);
        assert_eq!(
            TransactionStatus::from(Decision::Declined(DeclineReason::EmptyCvv)),
            TransactionStatus::Failed
        );
        assert_eq!("success".parse::<TransactionStatus>().unwrap(), TransactionStatus::Success);
        assert!("pending".parse::<TransactionStatus>().is_err());
    }

    #[test]
    fn test_poisoned_lock_is_reported() {
        let ledger = memory_ledger();
        let conn = ledger.connection();

        let _ = std::thread::spawn(move || {
            let _guard = conn.lock().unwrap();
            panic!("poison the ledger lock");
        })
        .join();

        let result = ledger.record(&test_token(), dec!(1.00), TransactionStatus::Success);
        assert!(matches!(result, Err(PersistenceError::LedgerUnavailable)));
    }
}
