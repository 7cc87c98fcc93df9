// Payment authorization seam
// A network-backed processor implements `Authorizer` and replaces the
// simulated one without touching the pipeline.

use rust_decimal::Decimal;
use std::fmt;

/// Why a processor refused a payment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclineReason {
    EmptyToken,
    NonPositiveAmount,
    EmptyExpiry,
    EmptyCvv,
    InvalidCvvLength,
}

impl fmt::Display for DeclineReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DeclineReason::EmptyToken => "empty token",
            DeclineReason::NonPositiveAmount => "invalid amount",
            DeclineReason::EmptyExpiry => "empty expiry",
            DeclineReason::EmptyCvv => "empty CVV",
            DeclineReason::InvalidCvvLength => "invalid CVV length",
        };
        f.write_str(text)
    }
}

/// Binary outcome of an authorization. There are no partial states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approved,
    Declined(DeclineReason),
}

impl Decision {
    pub fn is_approved(&self) -> bool {
        matches!(self, Decision::Approved)
    }
}

/// Synchronous, single-shot authorization request.
pub trait Authorizer: Send + Sync {
    fn authorize(&self, token: &str, amount: Decimal, expiry: &str, cvv: &str) -> Decision;
}

pub type AuthorizerBox = Box<dyn Authorizer>;

/// Stand-in processor: re-checks its inputs and otherwise approves.
///
/// The checks duplicate the validator on purpose so the authorizer is safe to
/// call outside the normal pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedAuthorizer;

impl SimulatedAuthorizer {
    pub fn new() -> Self {
        SimulatedAuthorizer
    }
}

impl Authorizer for SimulatedAuthorizer {
    fn authorize(&self, token: &str, amount: Decimal, expiry: &str, cvv: &str) -> Decision {
        let declined = if token.is_empty() {
            Some(DeclineReason::EmptyToken)
        } else if amount <= Decimal::ZERO {
            Some(DeclineReason::NonPositiveAmount)
        } else if expiry.is_empty() {
            Some(DeclineReason::EmptyExpiry)
        } else if cvv.is_empty() {
            Some(DeclineReason::EmptyCvv)
        } else if cvv.len() != 3 {
            Some(DeclineReason::InvalidCvvLength)
        } else {
            None
        };

        match declined {
            Some(reason) => Decision::Declined(reason),
            None => Decision::Approved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const TOKEN: &str = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08";

    #[test]
    fn test_approves_well_formed_input() {
        let decision = SimulatedAuthorizer::new().authorize(TOKEN, dec!(100.00), "12/30", "123");
        assert_eq!(decision, Decision::Approved);
        assert!(decision.is_approved());
    }

    #[test]
    fn test_defensive_declines() {
        let auth = SimulatedAuthorizer::new();
        let cases = [
            ("", dec!(1.00), "12/30", "123", DeclineReason::EmptyToken),
            (TOKEN, dec!(0), "12/30", "123", DeclineReason::NonPositiveAmount),
            (TOKEN, dec!(-5.00), "12/30", "123", DeclineReason::NonPositiveAmount),
            (TOKEN, dec!(1.00), "", "123", DeclineReason::EmptyExpiry),
            (TOKEN, dec!(1.00), "12/30", "", DeclineReason::EmptyCvv),
            (TOKEN, dec!(1.00), "12/30", "12", DeclineReason::InvalidCvvLength),
            (TOKEN, dec!(1.00), "12/30", "1234", DeclineReason::InvalidCvvLength),
        ];

        for (token, amount, expiry, cvv, reason) in cases {
            assert_eq!(
                auth.authorize(token, amount, expiry, cvv),
                Decision::Declined(reason),
                "token={:?} amount={} expiry={:?} cvv={:?}",
                token,
                amount,
                expiry,
                cvv
            );
        }
    }

    #[test]
    fn test_is_deterministic() {
        let auth = SimulatedAuthorizer::new();
        for _ in 0..100 {
            assert!(auth.authorize(TOKEN, dec!(9.99), "01/40", "999").is_approved());
        }
    }

    #[test]
    fn test_usable_as_trait_object() {
        let boxed: AuthorizerBox = Box::new(SimulatedAuthorizer::new());
        assert!(!boxed.authorize("", dec!(1), "12/30", "123").is_approved());
    }
}
