// Payment Intake - Web Server
// REST API with Axum

use anyhow::{Context, Result};
use log::info;
use payment_intake::api::{router, AppState};
use payment_intake::{Config, PaymentPipeline, SimulatedAuthorizer, SqliteLedger};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Secret and storage are checked before binding; a bad config never serves a request
    let config = Config::from_env();
    let bind_addr = config.bind_addr()?;
    let tokenizer = config.tokenizer()?;
    let ledger = SqliteLedger::open(&config.database_path)?;
    info!("ledger opened: {:?}", config.database_path);

    let pipeline = PaymentPipeline::new(tokenizer, Box::new(SimulatedAuthorizer::new()), Box::new(ledger));
    let app = router(AppState::new(pipeline), &config.static_dir);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;

    info!("server starting on {}", bind_addr);
    info!("  API:    POST http://{}/api/payments", bind_addr);
    info!("  static: {:?} -> /static", config.static_dir);

    axum::serve(listener, app).await.context("Server terminated")?;

    Ok(())
}
