// Request validation - Luhn, expiry, CVV, amount
// Pure functions: no I/O, "today" is always passed in

use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;

use crate::error::ValidationError;
use crate::request::PaymentRequest;

/// Required number of digits after whitespace is stripped
pub const CARD_DIGITS: usize = 16;

/// Fractional digits kept for a recorded amount
pub const AMOUNT_SCALE: u32 = 2;

// ============================================================================
// VALIDATED VALUES
// ============================================================================

/// A card number that passed validation: exactly 16 ASCII digits once
/// ASCII whitespace is removed.
///
/// Keeps the input exactly as submitted, which is what gets tokenized.
/// Only the validator constructs this type, and the tokenizer only accepts
/// this type, so unvalidated input can never be tokenized.
#[derive(Clone, PartialEq, Eq)]
pub struct CardNumber {
    raw: String,
    digits: String,
}

impl CardNumber {
    /// Input as submitted, whitespace included
    pub(crate) fn raw(&self) -> &str {
        &self.raw
    }

    pub fn last_four(&self) -> &str {
        &self.digits[CARD_DIGITS - 4..]
    }
}

impl fmt::Debug for CardNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CardNumber(************{})", self.last_four())
    }
}

/// Card expiry as month and two-digit year.
///
/// The year is kept century-relative: `00` sorts before `99`, so a card
/// expiring in `01/00` is treated as already expired while the current
/// year is `99`. Known limitation, kept as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiry {
    pub month: u32,
    pub year: u32,
}

impl Expiry {
    /// True when the card is still valid during the month containing `today`
    pub fn is_current_or_future(&self, today: NaiveDate) -> bool {
        let current_year = today.year().rem_euclid(100) as u32;
        let current_month = today.month();

        self.year > current_year || (self.year == current_year && self.month >= current_month)
    }
}

impl fmt::Display for Expiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:02}", self.month, self.year)
    }
}

/// Output of a successful `validate`; consumed by the pipeline.
#[derive(Debug, Clone)]
pub struct ValidatedPayment {
    pub card: CardNumber,
    pub expiry: Expiry,
    pub cvv: String,
    /// Rounded to `AMOUNT_SCALE` fractional digits
    pub amount: Decimal,
}

// ============================================================================
// CHECKS
// ============================================================================

/// Validate a whole request, checking card, expiry, CVV and amount in that order.
pub fn validate(request: &PaymentRequest, today: NaiveDate) -> Result<ValidatedPayment, ValidationError> {
    let card = validate_card_number(&request.card_number)?;
    let expiry = validate_expiry(&request.expiry, today)?;
    validate_cvv(&request.cvv)?;
    let amount = validate_amount(request.amount)?;

    Ok(ValidatedPayment {
        card,
        expiry,
        cvv: request.cvv.clone(),
        amount,
    })
}

/// Strip ASCII whitespace, require 16 digits, then apply the Luhn checksum.
pub fn validate_card_number(input: &str) -> Result<CardNumber, ValidationError> {
    let digits: String = input.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    if digits.len() != CARD_DIGITS || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidCardNumber);
    }

    if !luhn_valid(&digits) {
        return Err(ValidationError::InvalidCardNumber);
    }

    Ok(CardNumber {
        raw: input.to_string(),
        digits,
    })
}

/// Luhn mod-10 check over a string of ASCII digits.
///
/// Walking from the rightmost digit, every second digit is doubled and
/// reduced by 9 when it exceeds 9. Non-digit input is rejected.
pub fn luhn_valid(digits: &str) -> bool {
    let mut sum = 0u32;

    for (i, b) in digits.bytes().rev().enumerate() {
        if !b.is_ascii_digit() {
            return false;
        }
        let mut digit = u32::from(b - b'0');
        if i % 2 == 1 {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
    }

    !digits.is_empty() && sum % 10 == 0
}

/// Parse `MM/YY` and reject invalid months or dates before `today`'s month.
pub fn validate_expiry(input: &str, today: NaiveDate) -> Result<Expiry, ValidationError> {
    let bytes = input.as_bytes();
    let well_formed = bytes.len() == 5
        && bytes[2] == b'/'
        && bytes[..2].iter().all(u8::is_ascii_digit)
        && bytes[3..].iter().all(u8::is_ascii_digit);

    if !well_formed {
        return Err(ValidationError::InvalidExpiry);
    }

    let month: u32 = input[..2].parse().map_err(|_| ValidationError::InvalidExpiry)?;
    let year: u32 = input[3..].parse().map_err(|_| ValidationError::InvalidExpiry)?;

    if !(1..=12).contains(&month) {
        return Err(ValidationError::InvalidExpiry);
    }

    let expiry = Expiry { month, year };
    if !expiry.is_current_or_future(today) {
        return Err(ValidationError::InvalidExpiry);
    }

    Ok(expiry)
}

/// Exactly three ASCII digits.
pub fn validate_cvv(input: &str) -> Result<(), ValidationError> {
    if input.len() == 3 && input.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidCvv)
    }
}

/// Strictly positive, rounded to cents. Amounts that round to zero are rejected.
pub fn validate_amount(amount: Decimal) -> Result<Decimal, ValidationError> {
    if amount <= Decimal::ZERO {
        return Err(ValidationError::InvalidAmount);
    }

    let mut rounded = amount.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() {
        return Err(ValidationError::InvalidAmount);
    }
    rounded.rescale(AMOUNT_SCALE);

    Ok(rounded)
}
