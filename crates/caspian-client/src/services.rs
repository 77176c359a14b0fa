//! # Collaborator Services
//!
//! The external services Caspian Checkout consumes, as object-safe async
//! traits. This crate never implements them against a real transport; the
//! embedding application (storefront backend, test harness) supplies the
//! implementations.
//!
//! ## Collaborator Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     External Collaborators                              │
//! │                                                                         │
//! │  CouponRegistry                                                         │
//! │  ├── validate_coupon()  - read-only check, feeds the pricing path       │
//! │  └── apply_coupon()     - commits usage counters; called ONLY when      │
//! │                           checkout finalizes, never while quoting       │
//! │                                                                         │
//! │  GatewayStatusService                                                   │
//! │  └── available_gateways() - descriptors with limits, fees, health       │
//! │                                                                         │
//! │  WalletService                                                          │
//! │  └── balance()          - the user's internal credit balance            │
//! │                                                                         │
//! │  Payment initiation, redirects, and confirmation polling live           │
//! │  entirely outside this workspace.                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use caspian_core::coupon::Coupon;
use caspian_core::error::CouponError;
use caspian_core::gateway::GatewayDescriptor;
use caspian_core::money::Money;
use caspian_core::order::LineItem;

use crate::error::ClientResult;

// =============================================================================
// Coupon Registry
// =============================================================================

/// What the registry answers for a validation request.
///
/// `coupon` carries the full record when the code is valid, so the client
/// can feed its local directory and let the ledger re-validate offline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponCheck {
    pub is_valid: bool,

    /// The registry's own discount estimate, when it computed one. The
    /// ledger recomputes locally; this is informational.
    pub discount: Option<Money>,

    /// Full coupon record for valid codes.
    pub coupon: Option<Coupon>,

    /// Rejection reason for invalid codes.
    pub error: Option<CouponError>,
}

impl CouponCheck {
    /// A valid answer carrying the coupon record.
    pub fn valid(coupon: Coupon, discount: Option<Money>) -> Self {
        CouponCheck {
            is_valid: true,
            discount,
            coupon: Some(coupon),
            error: None,
        }
    }

    /// A rejection with its reason.
    pub fn invalid(error: CouponError) -> Self {
        CouponCheck {
            is_valid: false,
            discount: None,
            coupon: None,
            error: Some(error),
        }
    }
}

/// The registry's answer to a server-side usage commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponCommit {
    pub success: bool,
    pub discount_amount: Money,
    pub final_amount: Money,
}

/// The coupon registry collaborator.
#[async_trait]
pub trait CouponRegistry: Send + Sync {
    /// Checks a code against the registry without consuming usage.
    ///
    /// Invalid codes are a *successful* call carrying `is_valid: false`;
    /// `Err` means the registry itself could not be reached.
    async fn validate_coupon(
        &self,
        code: &str,
        order_amount: Money,
        items: &[LineItem],
    ) -> ClientResult<CouponCheck>;

    /// Commits coupon usage against a finalized order.
    ///
    /// Called once, by the checkout finalization flow, after the user has
    /// paid. Never called from the pricing path.
    async fn apply_coupon(
        &self,
        code: &str,
        order_id: &str,
        order_amount: Money,
    ) -> ClientResult<CouponCommit>;
}

// =============================================================================
// Gateway Status Service
// =============================================================================

/// The gateway status collaborator.
#[async_trait]
pub trait GatewayStatusService: Send + Sync {
    /// Returns the gateway descriptors currently configured for an order of
    /// roughly this size.
    ///
    /// The amount is a hint for the collaborator's own filtering; amount
    /// limits are re-checked locally against the post-tax grand total.
    async fn available_gateways(&self, amount: Money) -> ClientResult<Vec<GatewayDescriptor>>;
}

// =============================================================================
// Wallet Service
// =============================================================================

/// The wallet balance collaborator.
#[async_trait]
pub trait WalletService: Send + Sync {
    /// Returns the user's current wallet balance.
    async fn balance(&self, user_id: &str) -> ClientResult<Money>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use caspian_core::coupon::{Applicability, CouponKind, CouponStatus};
    use caspian_core::money::Rate;

    fn welcome10() -> Coupon {
        Coupon {
            id: "00000000-0000-4000-8000-000000000001".into(),
            code: "WELCOME10".into(),
            kind: CouponKind::Percentage {
                rate: Rate::from_percent(10),
                max_discount: None,
            },
            minimum_order_amount: None,
            valid_from: None,
            valid_until: None,
            usage_limit_total: None,
            usage_limit_per_user: None,
            times_used_total: 0,
            times_used_by_user: 0,
            applicable_to: Applicability::All,
            combinable: true,
            status: CouponStatus::Active,
        }
    }

    #[test]
    fn test_coupon_check_constructors() {
        let valid = CouponCheck::valid(welcome10(), Some(Money::irt(100_000)));
        assert!(valid.is_valid);
        assert!(valid.coupon.is_some());
        assert!(valid.error.is_none());

        let invalid = CouponCheck::invalid(CouponError::NotFound {
            code: "GHOST".into(),
        });
        assert!(!invalid.is_valid);
        assert!(invalid.coupon.is_none());
    }

    #[test]
    fn test_coupon_check_serializes_camel_case() {
        let check = CouponCheck::invalid(CouponError::Expired {
            code: "OLD".into(),
        });
        let json = serde_json::to_value(&check).unwrap();
        assert_eq!(json["isValid"], false);
        assert_eq!(json["error"]["kind"], "expired");
    }
}
