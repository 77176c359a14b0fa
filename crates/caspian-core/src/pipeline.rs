//! # Pricing Pipeline
//!
//! Composes the coupon ledger, tax rules, and gateway catalog into one
//! deterministic quote.
//!
//! ## Sequencing Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  quote(order, codes, coupons, catalog, ctx)                             │
//! │                                                                         │
//! │  1. apply each code in input order      → applied[] + rejected[]        │
//! │     (per-code failures never abort the quote)                           │
//! │  2. discounted = subtotal − discounts   (floored at zero)               │
//! │  3. tax = rules.compute(discounted)     (config errors abort)           │
//! │  4. grand = discounted + tax                                            │
//! │  5. rank gateways against grand         (post-tax total is what the     │
//! │                                          gateway min/max limits see)    │
//! │                                                                         │
//! │  Pure: same order + codes + catalog + context ⇒ identical quote.        │
//! │  Time enters through ctx.now, never through the system clock.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A quote is never patched in place. Anything that changes - subtotal,
//! coupons, catalog - means a new `quote()` call and a fresh value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::coupon::{AppliedCoupon, CouponDirectory, CouponLedger};
use crate::error::{ArithmeticError, CouponError, QuoteError, ValidationError};
use crate::gateway::{GatewayCatalog, GatewayContext, GatewayType, RankedGateway};
use crate::money::Money;
use crate::order::OrderSnapshot;
use crate::tax::{TaxCharge, TaxLine, TaxRuleSet};

// =============================================================================
// Inputs
// =============================================================================

/// Per-request inputs that are not part of the order itself.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteContext {
    /// The instant the quote is computed at. Caller-supplied so identical
    /// inputs reproduce identical quotes.
    pub now: DateTime<Utc>,

    /// The gateway the user asked to pay with, if any.
    pub preferred_gateway: Option<GatewayType>,

    /// Wallet balance as last fetched, if the wallet service answered.
    pub wallet_balance: Option<Money>,
}

impl QuoteContext {
    pub fn new(now: DateTime<Utc>) -> Self {
        QuoteContext {
            now,
            preferred_gateway: None,
            wallet_balance: None,
        }
    }
}

// =============================================================================
// Output
// =============================================================================

/// A coupon code the quote could not apply, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RejectedCoupon {
    pub code: String,
    pub reason: CouponError,
}

/// Conditions the caller must surface even though the quote succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum QuoteWarning {
    /// The tax rule set had nothing enabled - zero tax was computed, which
    /// must be shown, not silently accepted.
    NoTaxRulesEnabled,
    /// Every ranked gateway is currently unable to take the payment.
    NoEligibleGateway,
}

/// The pipeline's sole output: everything the checkout UI needs to render
/// totals and payment options for one attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricingQuote {
    pub subtotal: Money,
    pub applied_coupons: Vec<AppliedCoupon>,
    pub rejected_coupons: Vec<RejectedCoupon>,
    pub discount_total: Money,
    pub tax_breakdown: Vec<TaxLine>,
    pub tax_total: Money,
    pub grand_total: Money,
    pub eligible_gateways: Vec<RankedGateway>,
    pub warnings: Vec<QuoteWarning>,
}

// =============================================================================
// Pipeline
// =============================================================================

/// The quote orchestrator. Holds the tax configuration; coupons and the
/// gateway catalog are supplied per call because they change underneath us.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingPipeline {
    tax_rules: TaxRuleSet,
}

impl PricingPipeline {
    pub fn new(tax_rules: TaxRuleSet) -> Self {
        PricingPipeline { tax_rules }
    }

    pub fn tax_rules(&self) -> &TaxRuleSet {
        &self.tax_rules
    }

    /// Computes a quote.
    ///
    /// Coupon failures annotate the quote (`rejected_coupons`); gateway
    /// problems annotate the ranked entries. Only tax misconfiguration,
    /// malformed inputs, and internal arithmetic breaches abort.
    pub fn quote(
        &self,
        order: &OrderSnapshot,
        codes: &[String],
        coupons: &CouponDirectory,
        catalog: &GatewayCatalog,
        ctx: &QuoteContext,
    ) -> Result<PricingQuote, QuoteError> {
        self.check_input_currencies(order, catalog, ctx)?;

        let subtotal = order.subtotal();

        // Step 1: coupons, partial success.
        let mut ledger = CouponLedger::new(subtotal.currency());
        let mut rejected = Vec::new();
        for code in codes {
            if let Err(reason) = ledger.apply(coupons, code, order, ctx.now) {
                rejected.push(RejectedCoupon {
                    code: code.trim().to_string(),
                    reason,
                });
            }
        }
        let discount_total = ledger.discount_total();

        // Step 2: the discounted base can only shrink, never go negative.
        let discounted_base = subtotal.saturating_sub(discount_total);

        // Step 3: taxes on the discounted base.
        let tax = self.tax_rules.compute(discounted_base)?;

        // Step 4: grand total.
        let grand_total = discounted_base + tax.total_tax;
        if grand_total.is_negative() {
            return Err(ArithmeticError::NegativeAmount {
                context: "grand total",
                amount: grand_total,
            }
            .into());
        }
        if grand_total < discounted_base {
            // Negative tax slipped through a rule set.
            return Err(ArithmeticError::NegativeAmount {
                context: "tax total",
                amount: tax.total_tax,
            }
            .into());
        }

        // Step 5: gateways against the post-tax total.
        let gateway_ctx = GatewayContext {
            preferred: ctx.preferred_gateway.clone(),
            wallet_balance: ctx.wallet_balance,
        };
        let eligible_gateways = catalog.rank(grand_total, &gateway_ctx);

        let mut warnings = Vec::new();
        if tax.no_rules_enabled {
            warnings.push(QuoteWarning::NoTaxRulesEnabled);
        }
        if !eligible_gateways.iter().any(|g| g.eligible) {
            warnings.push(QuoteWarning::NoEligibleGateway);
        }

        Ok(PricingQuote {
            subtotal,
            applied_coupons: ledger.applied(),
            rejected_coupons: rejected,
            discount_total,
            tax_breakdown: tax.lines,
            tax_total: tax.total_tax,
            grand_total,
            eligible_gateways,
            warnings,
        })
    }

    /// Rejects mixed-currency configuration before any money math runs.
    /// Past this point every operand shares the order currency.
    fn check_input_currencies(
        &self,
        order: &OrderSnapshot,
        catalog: &GatewayCatalog,
        ctx: &QuoteContext,
    ) -> Result<(), ValidationError> {
        let currency = order.subtotal().currency();
        let mismatch = |field: &str, found| ValidationError::CurrencyMismatch {
            field: field.to_string(),
            expected: currency,
            found,
        };

        for rule in &self.tax_rules.rules {
            if let TaxCharge::Fixed(amount) = rule.charge {
                if amount.currency() != currency {
                    return Err(mismatch("tax rule amount", amount.currency()));
                }
                if amount.is_negative() {
                    return Err(ValidationError::MustBePositive {
                        field: "tax rule amount".to_string(),
                    });
                }
            }
        }

        for descriptor in catalog.gateways() {
            for bound in [descriptor.min_amount, descriptor.max_amount]
                .into_iter()
                .flatten()
            {
                if bound.currency() != currency {
                    return Err(mismatch("gateway amount limit", bound.currency()));
                }
            }
            if let crate::gateway::FeeSchedule::Flat(fee) = descriptor.fee_schedule {
                if fee.currency() != currency {
                    return Err(mismatch("gateway flat fee", fee.currency()));
                }
            }
        }

        if let Some(balance) = ctx.wallet_balance {
            if balance.currency() != currency {
                return Err(mismatch("wallet balance", balance.currency()));
            }
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coupon::{Applicability, Coupon, CouponKind, CouponStatus};
    use crate::gateway::{FeeSchedule, GatewayDescriptor, GatewayFeatures};
    use crate::money::{Currency, Rate};
    use crate::order::{ItemType, LineItem};
    use crate::tax::{PricingMode, TaxKind, TaxRule};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn order(subtotal: i64) -> OrderSnapshot {
        OrderSnapshot::new(
            Money::irt(subtotal),
            vec![LineItem::new("rust-101", ItemType::Course, 1)],
        )
        .unwrap()
    }

    fn vat_9_pipeline() -> PricingPipeline {
        PricingPipeline::new(TaxRuleSet::new(
            vec![TaxRule::percentage(TaxKind::Vat, Rate::from_percent(9))],
            PricingMode::Exclusive,
        ))
    }

    fn coupon(id_suffix: u32, code: &str, kind: CouponKind, combinable: bool) -> Coupon {
        Coupon {
            id: format!("00000000-0000-4000-8000-{:012}", id_suffix),
            code: code.to_string(),
            kind,
            minimum_order_amount: None,
            valid_from: None,
            valid_until: None,
            usage_limit_total: None,
            usage_limit_per_user: None,
            times_used_total: 0,
            times_used_by_user: 0,
            applicable_to: Applicability::All,
            combinable,
            status: CouponStatus::Active,
        }
    }

    fn welcome10() -> Coupon {
        coupon(
            1,
            "WELCOME10",
            CouponKind::Percentage {
                rate: Rate::from_percent(10),
                max_discount: None,
            },
            true,
        )
    }

    fn bank(name: &str) -> GatewayDescriptor {
        GatewayDescriptor {
            gateway: GatewayType::BankGateway(name.to_string()),
            display_name: name.to_string(),
            is_available: true,
            is_healthy: true,
            min_amount: None,
            max_amount: None,
            fee_schedule: FeeSchedule::Free,
            features: GatewayFeatures {
                instant_confirmation: true,
                supports_refund: false,
                supports_installment: false,
            },
            priority_hint: 0,
        }
    }

    fn wallet() -> GatewayDescriptor {
        GatewayDescriptor {
            gateway: GatewayType::Wallet,
            display_name: "Wallet".to_string(),
            ..bank("wallet")
        }
    }

    fn codes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_plain_vat_quote() {
        // subtotal 1,000,000; VAT 9% exclusive → tax 90,000; grand 1,090,000
        let quote = vat_9_pipeline()
            .quote(
                &order(1_000_000),
                &[],
                &CouponDirectory::new(),
                &GatewayCatalog::new(vec![bank("pasargad")]),
                &QuoteContext::new(now()),
            )
            .unwrap();

        assert_eq!(quote.tax_total.minor_units(), 90_000);
        assert_eq!(quote.grand_total.minor_units(), 1_090_000);
        assert!(quote.applied_coupons.is_empty());
        assert!(quote.warnings.is_empty());
    }

    #[test]
    fn test_coupon_then_tax_then_total() {
        // WELCOME10 on 1,000,000 → discount 100,000; VAT 9% on 900,000
        // → 81,000; grand 981,000
        let dir: CouponDirectory = [welcome10()].into_iter().collect();

        let quote = vat_9_pipeline()
            .quote(
                &order(1_000_000),
                &codes(&["WELCOME10"]),
                &dir,
                &GatewayCatalog::new(vec![bank("pasargad")]),
                &QuoteContext::new(now()),
            )
            .unwrap();

        assert_eq!(quote.discount_total.minor_units(), 100_000);
        assert_eq!(quote.tax_total.minor_units(), 81_000);
        assert_eq!(quote.grand_total.minor_units(), 981_000);
        assert_eq!(quote.applied_coupons.len(), 1);
    }

    #[test]
    fn test_partial_coupon_success() {
        // Conflicting second coupon annotates the quote instead of failing it.
        let dir: CouponDirectory = [
            coupon(
                1,
                "SAVE50000",
                CouponKind::FixedAmount {
                    amount: Money::irt(50_000),
                },
                true,
            ),
            coupon(
                2,
                "FIRST20",
                CouponKind::Percentage {
                    rate: Rate::from_percent(20),
                    max_discount: None,
                },
                false,
            ),
        ]
        .into_iter()
        .collect();

        let quote = vat_9_pipeline()
            .quote(
                &order(1_000_000),
                &codes(&["SAVE50000", "FIRST20", "GHOST"]),
                &dir,
                &GatewayCatalog::new(vec![bank("pasargad")]),
                &QuoteContext::new(now()),
            )
            .unwrap();

        assert_eq!(quote.applied_coupons.len(), 1);
        assert_eq!(quote.applied_coupons[0].code, "SAVE50000");
        assert_eq!(quote.rejected_coupons.len(), 2);
        assert!(matches!(
            quote.rejected_coupons[0].reason,
            CouponError::Conflict { .. }
        ));
        assert!(matches!(
            quote.rejected_coupons[1].reason,
            CouponError::NotFound { .. }
        ));
        assert_eq!(quote.discount_total.minor_units(), 50_000);
    }

    #[test]
    fn test_underfunded_wallet_annotated_and_bank_first() {
        let dir: CouponDirectory = [welcome10()].into_iter().collect();
        let mut ctx = QuoteContext::new(now());
        ctx.wallet_balance = Some(Money::irt(500_000));

        let quote = vat_9_pipeline()
            .quote(
                &order(1_000_000),
                &codes(&["WELCOME10"]),
                &dir,
                &GatewayCatalog::new(vec![wallet(), bank("pasargad")]),
                &ctx,
            )
            .unwrap();

        assert_eq!(quote.grand_total.minor_units(), 981_000);
        let first = &quote.eligible_gateways[0];
        let second = &quote.eligible_gateways[1];
        assert!(first.eligible);
        assert_eq!(first.gateway.display_name, "pasargad");
        assert!(!second.eligible);
        assert!(matches!(
            second.ineligibility,
            Some(crate::error::GatewayError::InsufficientWalletBalance { .. })
        ));
    }

    #[test]
    fn test_gateway_minimum_checked_against_post_tax_total() {
        let mut strict = bank("pasargad");
        strict.min_amount = Some(Money::irt(10_000));

        let quote = PricingPipeline::new(TaxRuleSet::empty())
            .quote(
                &order(5_000),
                &[],
                &CouponDirectory::new(),
                &GatewayCatalog::new(vec![strict]),
                &QuoteContext::new(now()),
            )
            .unwrap();

        assert_eq!(quote.grand_total.minor_units(), 5_000);
        assert!(!quote.eligible_gateways[0].eligible);
        assert!(quote.warnings.contains(&QuoteWarning::NoEligibleGateway));
    }

    #[test]
    fn test_quote_is_idempotent_and_byte_identical() {
        let dir: CouponDirectory = [welcome10()].into_iter().collect();
        let catalog = GatewayCatalog::new(vec![wallet(), bank("pasargad")]);
        let pipeline = vat_9_pipeline();
        let mut ctx = QuoteContext::new(now());
        ctx.wallet_balance = Some(Money::irt(2_000_000));

        let order = order(1_000_000);
        let wanted = codes(&["WELCOME10"]);

        let a = pipeline.quote(&order, &wanted, &dir, &catalog, &ctx).unwrap();
        let b = pipeline.quote(&order, &wanted, &dir, &catalog, &ctx).unwrap();

        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_discount_never_exceeds_subtotal() {
        let dir: CouponDirectory = [
            coupon(
                1,
                "BIG1",
                CouponKind::FixedAmount {
                    amount: Money::irt(900_000),
                },
                true,
            ),
            coupon(
                2,
                "BIG2",
                CouponKind::FixedAmount {
                    amount: Money::irt(800_000),
                },
                true,
            ),
        ]
        .into_iter()
        .collect();

        let quote = vat_9_pipeline()
            .quote(
                &order(1_000_000),
                &codes(&["BIG1", "BIG2"]),
                &dir,
                &GatewayCatalog::new(vec![bank("pasargad")]),
                &QuoteContext::new(now()),
            )
            .unwrap();

        assert_eq!(quote.discount_total.minor_units(), 1_000_000);
        assert_eq!(quote.grand_total.minor_units(), 0);
        assert!(!quote.grand_total.is_negative());
    }

    #[test]
    fn test_empty_cart_quotes_to_zero() {
        let empty = OrderSnapshot::new(Money::zero(Currency::Irt), vec![]).unwrap();

        let quote = vat_9_pipeline()
            .quote(
                &empty,
                &[],
                &CouponDirectory::new(),
                &GatewayCatalog::default(),
                &QuoteContext::new(now()),
            )
            .unwrap();

        assert!(quote.grand_total.is_zero());
        assert!(quote.tax_breakdown.is_empty());
    }

    #[test]
    fn test_zero_tax_rules_warns() {
        let quote = PricingPipeline::new(TaxRuleSet::empty())
            .quote(
                &order(1_000_000),
                &[],
                &CouponDirectory::new(),
                &GatewayCatalog::new(vec![bank("pasargad")]),
                &QuoteContext::new(now()),
            )
            .unwrap();

        assert!(quote.tax_total.is_zero());
        assert!(quote.warnings.contains(&QuoteWarning::NoTaxRulesEnabled));
    }

    #[test]
    fn test_inclusive_fixed_rule_aborts_the_quote() {
        let pipeline = PricingPipeline::new(TaxRuleSet::new(
            vec![TaxRule::fixed(TaxKind::ServiceCharge, Money::irt(5_000))],
            PricingMode::Inclusive,
        ));

        let err = pipeline
            .quote(
                &order(1_000_000),
                &[],
                &CouponDirectory::new(),
                &GatewayCatalog::default(),
                &QuoteContext::new(now()),
            )
            .unwrap_err();

        assert!(matches!(err, QuoteError::Tax(_)));
    }

    #[test]
    fn test_foreign_currency_wallet_balance_rejected_at_boundary() {
        let mut ctx = QuoteContext::new(now());
        ctx.wallet_balance = Some(Money::from_minor(100, Currency::Usd));

        let err = vat_9_pipeline()
            .quote(
                &order(1_000_000),
                &[],
                &CouponDirectory::new(),
                &GatewayCatalog::default(),
                &ctx,
            )
            .unwrap_err();

        assert!(matches!(err, QuoteError::Validation(_)));
    }

    #[test]
    fn test_grand_total_never_below_discounted_base() {
        // Property from the totals contract: tax can only add.
        for subtotal in [0, 5_000, 999_999, 1_000_000] {
            let quote = vat_9_pipeline()
                .quote(
                    &order(subtotal),
                    &[],
                    &CouponDirectory::new(),
                    &GatewayCatalog::default(),
                    &QuoteContext::new(now()),
                )
                .unwrap();

            let floor = quote.subtotal.saturating_sub(quote.discount_total);
            assert!(quote.grand_total >= floor);
        }
    }
}
