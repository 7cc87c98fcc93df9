// Payment Intake - operator CLI
//
//   payment-intake init
//   payment-intake count
//   payment-intake check <card> <expiry> <cvv> <amount>
//   payment-intake tokenize <card>

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;

use payment_intake::{setup_database, validate, validate_card_number, verify_count, Config, PaymentRequest};

const USAGE: &str = "Usage:
  payment-intake init
  payment-intake count
  payment-intake check <card> <expiry> <cvv> <amount>
  payment-intake tokenize <card>";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        Some("init") => run_init(&Config::from_env()),
        Some("count") => run_count(&Config::from_env()),
        Some("check") if args.len() == 5 => run_check(&args[1], &args[2], &args[3], &args[4]),
        Some("tokenize") if args.len() == 2 => run_tokenize(&Config::from_env(), &args[1]),
        _ => bail!("{}", USAGE),
    }
}

fn run_init(config: &Config) -> Result<()> {
    let conn = Connection::open(&config.database_path)
        .with_context(|| format!("Failed to open {:?}", config.database_path))?;
    setup_database(&conn)?;

    println!("✓ Ledger initialized with WAL mode: {:?}", config.database_path);
    Ok(())
}

fn run_count(config: &Config) -> Result<()> {
    if !config.database_path.exists() {
        bail!("Ledger not found at {:?}. Run: payment-intake init", config.database_path);
    }

    let conn = Connection::open(&config.database_path)?;
    let count = verify_count(&conn)?;

    println!("✓ Ledger contains {} transactions", count);
    Ok(())
}

fn run_check(card: &str, expiry: &str, cvv: &str, amount: &str) -> Result<()> {
    let report = check_report(card, expiry, cvv, amount, Utc::now().date_naive())?;
    println!("{}", report);
    Ok(())
}

/// Verdict line for `check`. Mentions only the last four card digits.
fn check_report(card: &str, expiry: &str, cvv: &str, amount: &str, today: NaiveDate) -> Result<String> {
    let amount = Decimal::from_str(amount).with_context(|| format!("Not a decimal amount: {:?}", amount))?;
    let request = PaymentRequest::new(card, expiry, cvv, amount);

    match validate(&request, today) {
        Ok(payment) => Ok(format!(
            "✓ Valid: card ending {}, expiry {}, amount {}",
            payment.card.last_four(),
            payment.expiry,
            payment.amount
        )),
        Err(reason) => bail!("✗ {}", reason),
    }
}

fn run_tokenize(config: &Config, card: &str) -> Result<()> {
    let tokenizer = config.tokenizer()?;
    let card = validate_card_number(card)?;

    println!("{}", tokenizer.tokenize(&card));
    Ok(())
}
