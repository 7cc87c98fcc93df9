// Payment pipeline - Validator -> Tokenizer -> Authorizer -> Ledger
//
// Received -> Validated -> Tokenized -> Authorized(..) -> Recorded -> Responded
//
// Validation failures jump straight to Responded. Approved and declined
// payments are both recorded; only the status differs.

use chrono::{NaiveDate, Utc};
use log::{debug, error, info, warn};
use uuid::Uuid;

use crate::authorizer::{AuthorizerBox, DeclineReason, Decision};
use crate::db::{LedgerBox, TransactionId, TransactionStatus, SENTINEL_TRANSACTION_ID};
use crate::error::ValidationError;
use crate::request::{PaymentRequest, PaymentResponse};
use crate::tokenizer::Tokenizer;
use crate::validator;

// ============================================================================
// STATES & OUTCOMES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Validated,
    Tokenized,
    Authorized(Decision),
    Recorded,
    Responded,
}

/// How the caller should classify the outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeClass {
    ClientError,
    Success,
    ServerError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// Failed validation; nothing tokenized or recorded
    Rejected(ValidationError),

    /// Approved and recorded as `success`
    Approved { transaction_id: TransactionId },

    /// Declined and recorded as `failed`
    Declined {
        transaction_id: TransactionId,
        reason: DeclineReason,
    },

    /// Ledger insert failed; zero rows exist for this request
    NotRecorded,
}

impl PaymentOutcome {
    pub fn transaction_id(&self) -> TransactionId {
        match self {
            PaymentOutcome::Approved { transaction_id } => *transaction_id,
            PaymentOutcome::Declined { transaction_id, .. } => *transaction_id,
            PaymentOutcome::Rejected(_) | PaymentOutcome::NotRecorded => SENTINEL_TRANSACTION_ID,
        }
    }

    /// Only `Success` means the payment is confirmed.
    pub fn class(&self) -> OutcomeClass {
        match self {
            PaymentOutcome::Rejected(_) => OutcomeClass::ClientError,
            PaymentOutcome::Approved { .. } => OutcomeClass::Success,
            PaymentOutcome::Declined { .. } | PaymentOutcome::NotRecorded => OutcomeClass::ServerError,
        }
    }

    pub fn message(&self) -> String {
        match self {
            PaymentOutcome::Rejected(reason) => reason.to_string(),
            PaymentOutcome::Approved { .. } => "Payment successful".to_string(),
            PaymentOutcome::Declined { .. } => "Payment declined".to_string(),
            PaymentOutcome::NotRecorded => "Payment failed".to_string(),
        }
    }

    pub fn to_response(&self) -> PaymentResponse {
        PaymentResponse {
            message: self.message(),
            transaction_id: self.transaction_id(),
        }
    }
}

/// Result of one pass through the pipeline
#[derive(Debug, Clone)]
pub struct PaymentReceipt {
    pub request_id: Uuid,
    pub outcome: PaymentOutcome,
    /// States visited, in order
    pub stages: Vec<Stage>,
}

impl PaymentReceipt {
    pub fn passed(&self, stage: Stage) -> bool {
        self.stages.contains(&stage)
    }

    pub fn was_tokenized(&self) -> bool {
        self.passed(Stage::Tokenized)
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

/// Stateless between requests; safe to share behind an `Arc`.
pub struct PaymentPipeline {
    tokenizer: Tokenizer,
    authorizer: AuthorizerBox,
    ledger: LedgerBox,
}

impl PaymentPipeline {
    pub fn new(tokenizer: Tokenizer, authorizer: AuthorizerBox, ledger: LedgerBox) -> Self {
        PaymentPipeline {
            tokenizer,
            authorizer,
            ledger,
        }
    }

    /// Process one request against today's UTC date
    pub fn process(&self, request: PaymentRequest) -> PaymentReceipt {
        self.process_at(request, Utc::now().date_naive())
    }

    pub fn process_at(&self, request: PaymentRequest, today: NaiveDate) -> PaymentReceipt {
        let request_id = Uuid::new_v4();
        let mut stages = vec![Stage::Received];

        let outcome = self.run(request_id, request, today, &mut stages);
        stages.push(Stage::Responded);

        PaymentReceipt {
            request_id,
            outcome,
            stages,
        }
    }

    fn run(
        &self,
        request_id: Uuid,
        request: PaymentRequest,
        today: NaiveDate,
        stages: &mut Vec<Stage>,
    ) -> PaymentOutcome {
        let payment = match validator::validate(&request, today) {
            Ok(payment) => payment,
            Err(reason) => {
                debug!("[{}] rejected: {}", request_id, reason);
                return PaymentOutcome::Rejected(reason);
            }
        };
        drop(request);
        stages.push(Stage::Validated);

        let token = self.tokenizer.tokenize(&payment.card);
        stages.push(Stage::Tokenized);

        let expiry = payment.expiry.to_string();
        let decision = self
            .authorizer
            .authorize(token.as_str(), payment.amount, &expiry, &payment.cvv);
        stages.push(Stage::Authorized(decision));

        if let Decision::Declined(reason) = decision {
            warn!("[{}] declined: token={} reason={}", request_id, token.prefix(), reason);
        }

        let status = TransactionStatus::from(decision);
        let transaction_id = match self.ledger.record(&token, payment.amount, status) {
            Ok(id) => id,
            Err(e) => {
                error!(
                    "[{}] failed to store transaction: token={} amount={} status={}: {}",
                    request_id,
                    token.prefix(),
                    payment.amount,
                    status,
                    e
                );
                return PaymentOutcome::NotRecorded;
            }
        };
        stages.push(Stage::Recorded);

        info!(
            "[{}] payment processed: token={} amount={} status={} transaction_id={}",
            request_id,
            token.prefix(),
            payment.amount,
            status,
            transaction_id
        );

        match decision {
            Decision::Approved => PaymentOutcome::Approved { transaction_id },
            Decision::Declined(reason) => PaymentOutcome::Declined {
                transaction_id,
                reason,
            },
        }
    }
}
