// Wire types for the payment endpoint

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::db::TransactionId;

/// Incoming card payment, request-scoped.
///
/// Holds raw card data, so it is never persisted and its `Debug` output
/// masks the card number and CVV.
#[derive(Clone, Deserialize)]
pub struct PaymentRequest {
    /// Digits, possibly separated by whitespace
    pub card_number: String,

    /// `MM/YY`
    pub expiry: String,

    pub cvv: String,

    /// Accepts a JSON number or a decimal string
    pub amount: Decimal,
}

impl PaymentRequest {
    pub fn new(card_number: &str, expiry: &str, cvv: &str, amount: Decimal) -> Self {
        Self {
            card_number: card_number.to_string(),
            expiry: expiry.to_string(),
            cvv: cvv.to_string(),
            amount,
        }
    }
}

impl fmt::Debug for PaymentRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentRequest")
            .field("card_number", &"<redacted>")
            .field("expiry", &self.expiry)
            .field("cvv", &"<redacted>")
            .field("amount", &self.amount)
            .finish()
    }
}

/// Body returned for every outcome of `POST /api/payments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub message: String,

    /// 0 when nothing was recorded
    pub transaction_id: TransactionId,
}
