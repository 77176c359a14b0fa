//! # Error Types
//!
//! Domain-specific error types for caspian-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  Recoverable (annotate the quote, never abort it)                      │
//! │  ├── CouponError      - per-code rejection reasons                     │
//! │  └── GatewayError     - per-gateway ineligibility reasons              │
//! │                                                                         │
//! │  Fatal (abort the quote - fail closed, never a misleading total)       │
//! │  ├── TaxConfigError   - unsupported tax configuration                  │
//! │  └── ArithmeticError  - internal invariant breach (programming error)  │
//! │                                                                         │
//! │  Boundary                                                               │
//! │  └── ValidationError  - malformed input rejected before any math runs  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (code, amounts, limits)
//! 3. Errors are enum variants, never String
//! 4. Recoverable errors serialize, so the frontend can show per-item reasons

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::money::{Currency, Money};

// =============================================================================
// Coupon Errors
// =============================================================================

/// Reasons a coupon code is rejected.
///
/// These are per-code and recoverable: the quote carries them alongside the
/// coupons that did apply ("3 of 4 applied, 1 rejected: reason").
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CouponError {
    /// Unknown code, or a coupon that is not publicly redeemable
    /// (draft, inactive, suspended).
    #[error("coupon not found: {code}")]
    NotFound { code: String },

    /// Outside the validity window, or administratively expired.
    #[error("coupon {code} has expired or is not yet valid")]
    Expired { code: String },

    /// Order subtotal is below the coupon's minimum.
    #[error("order total {subtotal} is below the {minimum} minimum for coupon {code}")]
    BelowMinimum {
        code: String,
        minimum: Money,
        subtotal: Money,
    },

    /// Total or per-user usage limit reached.
    #[error("coupon {code} has reached its usage limit")]
    UsageExceeded { code: String },

    /// No line item in the order matches the coupon's applicability.
    #[error("coupon {code} does not apply to any item in this order")]
    NotApplicable { code: String },

    /// Combinability conflict: the code is already applied, or a
    /// non-combinable coupon is involved on either side.
    #[error("coupon {code} cannot be combined with the applied coupons")]
    Conflict { code: String },
}

impl CouponError {
    /// The code the rejection refers to.
    pub fn code(&self) -> &str {
        match self {
            CouponError::NotFound { code }
            | CouponError::Expired { code }
            | CouponError::BelowMinimum { code, .. }
            | CouponError::UsageExceeded { code }
            | CouponError::NotApplicable { code }
            | CouponError::Conflict { code } => code,
        }
    }
}

// =============================================================================
// Tax Configuration Errors
// =============================================================================

/// Tax rule set configurations the engine refuses to evaluate.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum TaxConfigError {
    /// A fixed-amount rule is enabled under inclusive pricing. There is no
    /// well-defined way to extract a fixed charge out of a tax-inclusive
    /// total, so the whole quote is refused instead of guessing.
    #[error("fixed-amount tax rules are not supported in inclusive pricing mode")]
    UnsupportedFixedInclusive,
}

// =============================================================================
// Gateway Errors
// =============================================================================

/// Reasons a payment gateway is ineligible for a given total.
///
/// Per-gateway and recoverable: the catalog annotates the ranked entry
/// instead of dropping it, so the UI can explain a greyed-out option.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GatewayError {
    /// The gateway (or a service it depends on, e.g. wallet balance)
    /// could not be reached. Retryable by the caller.
    #[error("payment gateway is unavailable")]
    Unavailable,

    /// The gateway-status collaborator reports the gateway down.
    #[error("payment gateway is unhealthy")]
    Unhealthy,

    /// The payable amount falls outside the gateway's accepted range.
    #[error("amount {amount} is outside the accepted range for this gateway")]
    AmountOutOfRange { amount: Money },

    /// Wallet balance does not cover the payable amount.
    #[error("wallet balance {balance} does not cover {required}")]
    InsufficientWalletBalance { balance: Money, required: Money },
}

// =============================================================================
// Arithmetic Invariant Errors
// =============================================================================

/// Internal arithmetic invariant breaches.
///
/// These signal programming errors, never user mistakes. They abort the
/// quote and must not be surfaced to shoppers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArithmeticError {
    /// A total that must be non-negative came out negative.
    #[error("arithmetic invariant violated in {context}: negative amount {amount}")]
    NegativeAmount { context: &'static str, amount: Money },

    /// Two amounts in different currencies reached the same calculation.
    #[error("arithmetic invariant violated: {left} mixed with {right}")]
    CurrencyMismatch { left: Currency, right: Currency },
}

// =============================================================================
// Quote Errors
// =============================================================================

/// Fatal quote failures. Everything recoverable is carried inside the
/// quote itself; only these abort it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuoteError {
    /// The tax rule set cannot be evaluated as configured.
    #[error("tax configuration error: {0}")]
    Tax(#[from] TaxConfigError),

    /// An internal invariant broke mid-calculation.
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),

    /// An input failed boundary validation.
    #[error("invalid quote input: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input doesn't meet requirements. Used for early
/// validation before any pricing logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, bad coupon code characters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate coupon code in a directory).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },

    /// An amount in a different currency than the order's.
    #[error("{field} is in {found}, expected {expected}")]
    CurrencyMismatch {
        field: String,
        expected: Currency,
        found: Currency,
    },
}

// =============================================================================
// Unit Tests
// =============================================================================
