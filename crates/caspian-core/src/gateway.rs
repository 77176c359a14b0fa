//! # Payment Gateways
//!
//! Gateway descriptors and the catalog that ranks them for a payable total.
//!
//! ## Ranking Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  rank(total, context)                                                   │
//! │                                                                         │
//! │  1. DROP      gateways configured unavailable                           │
//! │  2. ANNOTATE  (never drop) unhealthy / out-of-range / underfunded       │
//! │               wallet entries with a machine-readable reason             │
//! │  3. ORDER     eligible first, then:                                     │
//! │               preferred match → healthy → funded wallet → lowest fee    │
//! │               (ties: priority hint, then declaration order)             │
//! │                                                                         │
//! │  Every entry carries payable = total + fee, so the UI can render the    │
//! │  final charge per option without re-deriving it.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Descriptors come from the gateway-status collaborator and are read-only
//! here; health may be stale up to that service's own TTL.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::GatewayError;
use crate::money::{Money, Rate};

// =============================================================================
// Descriptor Model
// =============================================================================

/// The payment channels the storefront can route to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "channel", content = "name", rename_all = "snake_case")]
pub enum GatewayType {
    /// The user's internal credit wallet.
    Wallet,
    /// A named bank PSP (several are configured at once).
    BankGateway(String),
    /// Manual card-to-card / SHEBA transfer, confirmed by an operator.
    BankTransfer,
    /// Crypto checkout for international customers.
    Crypto,
}

/// How a gateway charges its service fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "fee_type", content = "fee", rename_all = "snake_case")]
pub enum FeeSchedule {
    Free,
    Flat(Money),
    PercentageOfTotal(Rate),
}

impl FeeSchedule {
    /// The fee charged on top of a total. Percentage fees floor.
    pub fn evaluate(&self, total: Money) -> Money {
        match self {
            FeeSchedule::Free => Money::zero(total.currency()),
            FeeSchedule::Flat(fee) => {
                debug_assert_eq!(fee.currency(), total.currency());
                *fee
            }
            FeeSchedule::PercentageOfTotal(rate) => total.percentage_of(*rate),
        }
    }
}

/// Capabilities the UI surfaces per gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct GatewayFeatures {
    pub instant_confirmation: bool,
    pub supports_refund: bool,
    pub supports_installment: bool,
}

/// One payment gateway as the status collaborator reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct GatewayDescriptor {
    pub gateway: GatewayType,
    pub display_name: String,

    /// Configured on/off switch. Unavailable gateways never reach the UI.
    pub is_available: bool,

    /// Liveness as last observed by the status collaborator.
    pub is_healthy: bool,

    /// Smallest total the gateway accepts, if it has a floor.
    pub min_amount: Option<Money>,

    /// Largest total the gateway accepts, if it has a ceiling.
    pub max_amount: Option<Money>,

    pub fee_schedule: FeeSchedule,
    pub features: GatewayFeatures,

    /// Catalog ordering hint; lower sorts earlier among otherwise-equal
    /// entries.
    pub priority_hint: u32,
}

impl GatewayDescriptor {
    /// What the customer actually pays through this gateway.
    pub fn payable_amount(&self, total: Money) -> Money {
        total + self.fee_schedule.evaluate(total)
    }

    fn is_wallet(&self) -> bool {
        matches!(self.gateway, GatewayType::Wallet)
    }
}

// =============================================================================
// Ranking
// =============================================================================

/// Caller-side inputs that influence ranking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GatewayContext {
    /// The gateway the user (or a stored preference) asked for.
    pub preferred: Option<GatewayType>,

    /// Wallet balance, when the wallet service answered. `None` marks the
    /// wallet gateway unavailable rather than guessing it is funded.
    pub wallet_balance: Option<Money>,
}

/// One catalog entry ranked against a concrete total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RankedGateway {
    pub gateway: GatewayDescriptor,
    pub fee: Money,
    pub payable_amount: Money,
    pub eligible: bool,
    /// Why the entry is not payable right now, when it is not.
    pub ineligibility: Option<GatewayError>,
}

/// The gateway descriptors known for the current pricing request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatewayCatalog {
    gateways: Vec<GatewayDescriptor>,
}

impl GatewayCatalog {
    pub fn new(gateways: Vec<GatewayDescriptor>) -> Self {
        GatewayCatalog { gateways }
    }

    pub fn gateways(&self) -> &[GatewayDescriptor] {
        &self.gateways
    }

    pub fn is_empty(&self) -> bool {
        self.gateways.is_empty()
    }

    /// Ranks the catalog for a payable total.
    ///
    /// Configured-off gateways are dropped; everything else stays in the
    /// list, annotated when it cannot take the payment, ordered so the
    /// first entry is the best currently-payable choice.
    pub fn rank(&self, total: Money, ctx: &GatewayContext) -> Vec<RankedGateway> {
        let mut ranked: Vec<RankedGateway> = self
            .gateways
            .iter()
            .filter(|g| g.is_available)
            .map(|g| self.rank_one(g, total, ctx))
            .collect();

        ranked.sort_by_key(|r| {
            let preferred = ctx.preferred.as_ref() == Some(&r.gateway.gateway);
            let funded_wallet = r.gateway.is_wallet() && r.eligible;
            (
                !r.eligible,
                !preferred,
                !r.gateway.is_healthy,
                !funded_wallet,
                r.fee.minor_units(),
                r.gateway.priority_hint,
            )
        });

        ranked
    }

    fn rank_one(
        &self,
        descriptor: &GatewayDescriptor,
        total: Money,
        ctx: &GatewayContext,
    ) -> RankedGateway {
        let fee = descriptor.fee_schedule.evaluate(total);
        let payable_amount = total + fee;

        let out_of_range = descriptor.min_amount.is_some_and(|min| total < min)
            || descriptor.max_amount.is_some_and(|max| total > max);

        let ineligibility = if !descriptor.is_healthy {
            Some(GatewayError::Unhealthy)
        } else if out_of_range {
            Some(GatewayError::AmountOutOfRange { amount: total })
        } else if descriptor.is_wallet() {
            match ctx.wallet_balance {
                None => Some(GatewayError::Unavailable),
                Some(balance) if balance < payable_amount => {
                    Some(GatewayError::InsufficientWalletBalance {
                        balance,
                        required: payable_amount,
                    })
                }
                Some(_) => None,
            }
        } else {
            None
        };

        RankedGateway {
            gateway: descriptor.clone(),
            fee,
            payable_amount,
            eligible: ineligibility.is_none(),
            ineligibility,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(gateway: GatewayType, name: &str, fee: FeeSchedule) -> GatewayDescriptor {
        GatewayDescriptor {
            gateway,
            display_name: name.to_string(),
            is_available: true,
            is_healthy: true,
            min_amount: None,
            max_amount: None,
            fee_schedule: fee,
            features: GatewayFeatures {
                instant_confirmation: true,
                supports_refund: false,
                supports_installment: false,
            },
            priority_hint: 0,
        }
    }

    fn wallet() -> GatewayDescriptor {
        descriptor(GatewayType::Wallet, "کیف پول / Wallet", FeeSchedule::Free)
    }

    fn bank(name: &str) -> GatewayDescriptor {
        descriptor(
            GatewayType::BankGateway(name.to_string()),
            name,
            FeeSchedule::Free,
        )
    }

    #[test]
    fn test_fee_schedules() {
        let total = Money::irt(1_000_000);

        assert!(FeeSchedule::Free.evaluate(total).is_zero());
        assert_eq!(
            FeeSchedule::Flat(Money::irt(5_000)).evaluate(total).minor_units(),
            5_000
        );
        // 1.5% of 1,000,001 floors
        assert_eq!(
            FeeSchedule::PercentageOfTotal(Rate::from_bps(150))
                .evaluate(Money::irt(1_000_001))
                .minor_units(),
            15_000
        );
    }

    #[test]
    fn test_payable_amount_includes_fee() {
        let mut g = bank("pasargad");
        g.fee_schedule = FeeSchedule::Flat(Money::irt(5_000));
        assert_eq!(g.payable_amount(Money::irt(100_000)).minor_units(), 105_000);
    }

    #[test]
    fn test_unavailable_gateways_are_dropped() {
        let mut off = bank("mellat");
        off.is_available = false;

        let catalog = GatewayCatalog::new(vec![off, bank("pasargad")]);
        let ranked = catalog.rank(Money::irt(100_000), &GatewayContext::default());

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].gateway.display_name, "pasargad");
    }

    #[test]
    fn test_unhealthy_annotated_not_dropped() {
        let mut sick = bank("mellat");
        sick.is_healthy = false;

        let catalog = GatewayCatalog::new(vec![sick, bank("pasargad")]);
        let ranked = catalog.rank(Money::irt(100_000), &GatewayContext::default());

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].gateway.display_name, "pasargad");
        assert!(!ranked[1].eligible);
        assert_eq!(ranked[1].ineligibility, Some(GatewayError::Unhealthy));
    }

    #[test]
    fn test_below_minimum_excluded_with_reason() {
        // min 10,000 against a 5,000 total
        let mut strict = bank("pasargad");
        strict.min_amount = Some(Money::irt(10_000));

        let catalog = GatewayCatalog::new(vec![strict]);
        let ranked = catalog.rank(Money::irt(5_000), &GatewayContext::default());

        assert!(!ranked[0].eligible);
        assert_eq!(
            ranked[0].ineligibility,
            Some(GatewayError::AmountOutOfRange {
                amount: Money::irt(5_000)
            })
        );
    }

    #[test]
    fn test_above_maximum_excluded_with_reason() {
        let mut capped = bank("pasargad");
        capped.max_amount = Some(Money::irt(50_000_000));

        let catalog = GatewayCatalog::new(vec![capped]);
        let ranked = catalog.rank(Money::irt(60_000_000), &GatewayContext::default());
        assert!(matches!(
            ranked[0].ineligibility,
            Some(GatewayError::AmountOutOfRange { .. })
        ));
    }

    #[test]
    fn test_underfunded_wallet_sinks_below_healthy_bank() {
        // balance 500,000 against a 981,000 total
        let catalog = GatewayCatalog::new(vec![wallet(), bank("pasargad")]);
        let ctx = GatewayContext {
            preferred: None,
            wallet_balance: Some(Money::irt(500_000)),
        };

        let ranked = catalog.rank(Money::irt(981_000), &ctx);

        assert_eq!(ranked[0].gateway.display_name, "pasargad");
        assert!(ranked[0].eligible);
        assert!(!ranked[1].eligible);
        assert_eq!(
            ranked[1].ineligibility,
            Some(GatewayError::InsufficientWalletBalance {
                balance: Money::irt(500_000),
                required: Money::irt(981_000),
            })
        );
    }

    #[test]
    fn test_funded_wallet_outranks_external_gateways() {
        let catalog = GatewayCatalog::new(vec![bank("pasargad"), wallet()]);
        let ctx = GatewayContext {
            preferred: None,
            wallet_balance: Some(Money::irt(2_000_000)),
        };

        let ranked = catalog.rank(Money::irt(981_000), &ctx);
        assert!(ranked[0].gateway.is_wallet());
    }

    #[test]
    fn test_unknown_wallet_balance_reads_unavailable() {
        let catalog = GatewayCatalog::new(vec![wallet()]);
        let ranked = catalog.rank(Money::irt(100_000), &GatewayContext::default());

        assert!(!ranked[0].eligible);
        assert_eq!(ranked[0].ineligibility, Some(GatewayError::Unavailable));
    }

    #[test]
    fn test_preferred_gateway_ranks_first() {
        let catalog = GatewayCatalog::new(vec![bank("pasargad"), bank("mellat")]);
        let ctx = GatewayContext {
            preferred: Some(GatewayType::BankGateway("mellat".to_string())),
            wallet_balance: None,
        };

        let ranked = catalog.rank(Money::irt(100_000), &ctx);
        assert_eq!(ranked[0].gateway.display_name, "mellat");
    }

    #[test]
    fn test_cheaper_fee_ranks_first() {
        let mut pricey = bank("mellat");
        pricey.fee_schedule = FeeSchedule::Flat(Money::irt(10_000));
        let mut cheap = bank("pasargad");
        cheap.fee_schedule = FeeSchedule::Flat(Money::irt(2_000));

        let catalog = GatewayCatalog::new(vec![pricey, cheap]);
        let ranked = catalog.rank(Money::irt(100_000), &GatewayContext::default());

        assert_eq!(ranked[0].gateway.display_name, "pasargad");
        assert_eq!(ranked[0].payable_amount.minor_units(), 102_000);
        assert_eq!(ranked[1].payable_amount.minor_units(), 110_000);
    }

    #[test]
    fn test_priority_hint_breaks_fee_ties() {
        let mut second = bank("mellat");
        second.priority_hint = 2;
        let mut first = bank("pasargad");
        first.priority_hint = 1;

        let catalog = GatewayCatalog::new(vec![second, first]);
        let ranked = catalog.rank(Money::irt(100_000), &GatewayContext::default());
        assert_eq!(ranked[0].gateway.display_name, "pasargad");
    }
}
