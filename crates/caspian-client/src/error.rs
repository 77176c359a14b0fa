//! # Client Error Types
//!
//! Error types for the async collaborator boundary.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Client Error Categories                            │
//! │                                                                         │
//! │  Retryable (by the CALLER - this crate performs no retries)            │
//! │  ├── ValidationTimeout   - coupon validation exceeded its deadline     │
//! │  ├── GatewayUnavailable  - gateway status service unreachable          │
//! │  ├── WalletUnavailable   - wallet balance service unreachable          │
//! │  └── Service             - any other collaborator transport failure    │
//! │                                                                         │
//! │  Terminal (retrying is pointless)                                      │
//! │  ├── Superseded          - a newer request or ledger mutation won      │
//! │  ├── Coupon              - the code was rejected (domain reason)       │
//! │  ├── Quote               - the pricing core refused the quote          │
//! │  └── InvalidConfig       - the client was misconfigured                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use caspian_core::error::{CouponError, QuoteError};

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Client error type covering the async boundary's failure modes.
///
/// ## Design Principles
/// - Network problems surface as typed, retryable variants - never left
///   pending indefinitely
/// - Domain rejections from caspian-core pass through unchanged so callers
///   can match on them
/// - Retry policy belongs to the caller; this crate only classifies
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// Invalid client configuration.
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    /// Coupon validation did not answer within the request timeout.
    #[error("Coupon validation timed out")]
    ValidationTimeout,

    /// The gateway status service could not be reached (or timed out) and
    /// no cached catalog was available to serve instead.
    #[error("Gateway status service is unavailable")]
    GatewayUnavailable,

    /// The wallet balance service could not be reached.
    #[error("Wallet balance service is unavailable")]
    WalletUnavailable,

    /// A collaborator call failed for a reason other than timeout.
    #[error("Collaborator call failed: {0}")]
    Service(String),

    /// The operation was overtaken by a newer request or by a ledger
    /// mutation that happened while it was in flight. The result was
    /// discarded; whatever superseded it carries the current state.
    #[error("Superseded by a newer request")]
    Superseded,

    /// The coupon registry (or the local ledger) rejected the code.
    #[error(transparent)]
    Coupon(#[from] CouponError),

    /// The pricing core refused to produce a quote.
    #[error("Quote failed: {0}")]
    Quote(#[from] QuoteError),
}

// =============================================================================
// Error Categorization (for caller-side retry logic)
// =============================================================================

impl ClientError {
    /// Returns true if the operation can be retried as-is.
    ///
    /// ## Retryable Errors
    /// - Timeouts and unreachable collaborators (network weather)
    ///
    /// ## Non-Retryable Errors
    /// - Superseded results (a newer request already owns the state)
    /// - Domain rejections (the coupon really is expired)
    /// - Configuration errors
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::ValidationTimeout
                | ClientError::GatewayUnavailable
                | ClientError::WalletUnavailable
                | ClientError::Service(_)
        )
    }
}
