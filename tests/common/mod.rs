#![allow(dead_code)]

use payment_intake::{
    get_all_transactions, Authorizer, PaymentPipeline, SimulatedAuthorizer, SqliteLedger, Token,
    Transaction, TransactionId, TransactionStatus, Ledger, PersistenceError, Tokenizer,
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const SECRET: &str = "integration-test-secret";
pub const VALID_CARD: &str = "4539 1488 0343 6467";
pub const FAR_EXPIRY: &str = "12/99";

/// Pipeline over an in-memory SQLite ledger
pub fn sqlite_pipeline() -> (PaymentPipeline, SqliteLedger) {
    let ledger = SqliteLedger::new(Connection::open_in_memory().unwrap()).unwrap();
    let pipeline = PaymentPipeline::new(
        Tokenizer::new(SECRET).unwrap(),
        Box::new(SimulatedAuthorizer::new()),
        Box::new(ledger.clone()),
    );
    (pipeline, ledger)
}

/// Pipeline whose ledger aborts every insert with a SQLite trigger
pub fn failing_sqlite_pipeline() -> (PaymentPipeline, SqliteLedger) {
    let conn = Connection::open_in_memory().unwrap();
    payment_intake::setup_database(&conn).unwrap();
    conn.execute_batch(
        "CREATE TRIGGER reject_inserts BEFORE INSERT ON transactions
         BEGIN SELECT RAISE(ABORT, 'simulated storage failure'); END;",
    )
    .unwrap();

    let ledger = SqliteLedger::new(conn).unwrap();
    let pipeline = PaymentPipeline::new(
        Tokenizer::new(SECRET).unwrap(),
        Box::new(SimulatedAuthorizer::new()),
        Box::new(ledger.clone()),
    );
    (pipeline, ledger)
}

pub fn rows(ledger: &SqliteLedger) -> Vec<Transaction> {
    let conn = ledger.connection();
    let conn = conn.lock().unwrap();
    get_all_transactions(&conn).unwrap()
}

/// Counts calls, then delegates to the simulated processor
#[derive(Clone, Default)]
pub struct CountingAuthorizer {
    pub calls: Arc<AtomicUsize>,
}

impl Authorizer for CountingAuthorizer {
    fn authorize(&self, token: &str, amount: Decimal, expiry: &str, cvv: &str) -> payment_intake::Decision {
        self.calls.fetch_add(1, Ordering::SeqCst);
        SimulatedAuthorizer::new().authorize(token, amount, expiry, cvv)
    }
}

/// Counts calls, records nothing
#[derive(Clone, Default)]
pub struct CountingLedger {
    pub calls: Arc<AtomicUsize>,
}

impl Ledger for CountingLedger {
    fn record(&self, _: &Token, _: Decimal, _: TransactionStatus) -> Result<TransactionId, PersistenceError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(n as TransactionId + 1)
    }
}
