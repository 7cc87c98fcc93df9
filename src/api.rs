// REST API with Axum
// POST /api/payments runs the pipeline; GET /api/health for probes.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use log::{debug, error};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tower_http::services::ServeDir;

use crate::db::{TransactionId, SENTINEL_TRANSACTION_ID};
use crate::pipeline::{OutcomeClass, PaymentPipeline};
use crate::request::{PaymentRequest, PaymentResponse};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<PaymentPipeline>,
}

impl AppState {
    pub fn new(pipeline: PaymentPipeline) -> Self {
        AppState {
            pipeline: Arc::new(pipeline),
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: crate::VERSION,
    })
}

/// POST /api/payments - Validate, tokenize, authorize and record a payment
async fn create_payment(
    State(state): State<AppState>,
    payload: Result<Json<PaymentRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            debug!("rejected payload: {}", rejection);
            return payment_response(StatusCode::BAD_REQUEST, "Invalid request payload", SENTINEL_TRANSACTION_ID);
        }
    };

    // The ledger insert blocks, keep it off the async workers
    let pipeline = Arc::clone(&state.pipeline);
    let receipt = match tokio::task::spawn_blocking(move || pipeline.process(request)).await {
        Ok(receipt) => receipt,
        Err(e) => {
            error!("payment task aborted: {}", e);
            return payment_response(StatusCode::INTERNAL_SERVER_ERROR, "Payment failed", SENTINEL_TRANSACTION_ID);
        }
    };

    let status = match receipt.outcome.class() {
        OutcomeClass::ClientError => StatusCode::BAD_REQUEST,
        OutcomeClass::Success => StatusCode::OK,
        OutcomeClass::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (status, Json(receipt.outcome.to_response())).into_response()
}

fn payment_response(status: StatusCode, message: &str, transaction_id: TransactionId) -> Response {
    let body = PaymentResponse {
        message: message.to_string(),
        transaction_id,
    };
    (status, Json(body)).into_response()
}

// ============================================================================
// Router
// ============================================================================

/// API routes only, nested under `/api`
pub fn api_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/payments", post(create_payment))
        .with_state(state);

    Router::new().nest("/api", api_routes)
}

/// Full application: API plus static files under `/static`
pub fn router(state: AppState, static_dir: &Path) -> Router {
    api_router(state).nest_service("/static", ServeDir::new(static_dir))
}
