//! # Tax Rules
//!
//! Configurable tax computation over a discounted order base.
//!
//! ## Two Pricing Modes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  EXCLUSIVE (tax added on top)          INCLUSIVE (price contains tax)   │
//! │                                                                         │
//! │  base: 1,000,000                       given: 1,090,000                 │
//! │  VAT 9%    → +90,000                   implied rate = Σ enabled % = 9%  │
//! │  total: 1,090,000                      base = ⌊1,090,000 / 1.09⌋        │
//! │                                             = 1,000,000                 │
//! │                                        VAT recomputed on derived base   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rules evaluate in declaration order. A rule flagged
//! `applies_after_other_taxes` computes against `base + Σ(previous taxes)`,
//! which lets a municipal surcharge apply on top of VAT.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::TaxConfigError;
use crate::money::{Money, Rate};

// =============================================================================
// Rule Model
// =============================================================================

/// Kind of tax a rule represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TaxKind {
    Vat,
    ServiceCharge,
    Custom,
}

/// How a rule charges: a percentage of the taxable amount, or a fixed sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "rate_type", content = "rate", rename_all = "snake_case")]
pub enum TaxCharge {
    Percentage(Rate),
    Fixed(Money),
}

/// One configured tax rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TaxRule {
    pub kind: TaxKind,
    pub enabled: bool,
    pub charge: TaxCharge,
    /// Compute against `base + Σ(previously computed taxes)` instead of the
    /// original base.
    pub applies_after_other_taxes: bool,
}

impl TaxRule {
    /// An enabled percentage rule on the original base.
    pub fn percentage(kind: TaxKind, rate: Rate) -> Self {
        TaxRule {
            kind,
            enabled: true,
            charge: TaxCharge::Percentage(rate),
            applies_after_other_taxes: false,
        }
    }

    /// An enabled fixed-amount rule.
    pub fn fixed(kind: TaxKind, amount: Money) -> Self {
        TaxRule {
            kind,
            enabled: true,
            charge: TaxCharge::Fixed(amount),
            applies_after_other_taxes: false,
        }
    }
}

/// Whether quoted prices already contain tax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PricingMode {
    /// Price + tax shown separately.
    Exclusive,
    /// Price includes every enabled percentage tax.
    Inclusive,
}

impl Default for PricingMode {
    fn default() -> Self {
        PricingMode::Exclusive
    }
}

// =============================================================================
// Breakdown
// =============================================================================

/// One evaluated rule in a breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TaxLine {
    pub kind: TaxKind,
    /// Present for percentage rules; `None` for fixed charges.
    pub rate: Option<Rate>,
    /// The amount the rule was computed against.
    pub taxable_amount: Money,
    pub tax_amount: Money,
}

/// The result of evaluating a rule set against a base amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TaxBreakdown {
    pub lines: Vec<TaxLine>,
    pub total_tax: Money,
    /// The base taxes were computed against. Equals the input in exclusive
    /// mode; in inclusive mode it is the derived pre-tax base.
    pub effective_base: Money,
    /// True when the rule set had nothing enabled. The pipeline surfaces
    /// this as a visible warning - zero tax must never pass silently.
    pub no_rules_enabled: bool,
}

impl TaxBreakdown {
    fn empty(base: Money, no_rules_enabled: bool) -> Self {
        TaxBreakdown {
            lines: Vec::new(),
            total_tax: Money::zero(base.currency()),
            effective_base: base,
            no_rules_enabled,
        }
    }
}

// =============================================================================
// Rule Set
// =============================================================================

/// An ordered list of tax rules plus the pricing mode they evaluate under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TaxRuleSet {
    pub rules: Vec<TaxRule>,
    pub pricing_mode: PricingMode,
}

impl TaxRuleSet {
    pub fn new(rules: Vec<TaxRule>, pricing_mode: PricingMode) -> Self {
        TaxRuleSet { rules, pricing_mode }
    }

    /// A rule set that charges nothing.
    pub fn empty() -> Self {
        TaxRuleSet {
            rules: Vec::new(),
            pricing_mode: PricingMode::Exclusive,
        }
    }

    fn enabled_rules(&self) -> impl Iterator<Item = &TaxRule> {
        self.rules.iter().filter(|r| r.enabled)
    }

    fn has_enabled_rules(&self) -> bool {
        self.enabled_rules().next().is_some()
    }

    /// Evaluates the rule set against a base amount.
    ///
    /// ## Behavior
    /// - Exclusive mode: rules evaluate in declaration order against `base`
    ///   (or the running taxed total, for `applies_after_other_taxes` rules).
    /// - Inclusive mode: the given amount already contains every enabled
    ///   percentage tax; the pre-tax base is derived first, then rules
    ///   evaluate exactly as in exclusive mode. Fixed-amount rules are
    ///   rejected - there is no well-defined extraction for them.
    /// - `base ≤ 0` yields an empty breakdown (an empty cart quotes cleanly).
    pub fn compute(&self, base: Money) -> Result<TaxBreakdown, TaxConfigError> {
        if self.pricing_mode == PricingMode::Inclusive
            && self
                .enabled_rules()
                .any(|r| matches!(r.charge, TaxCharge::Fixed(_)))
        {
            return Err(TaxConfigError::UnsupportedFixedInclusive);
        }

        if !base.is_positive() {
            return Ok(TaxBreakdown::empty(base, !self.has_enabled_rules()));
        }

        if !self.has_enabled_rules() {
            return Ok(TaxBreakdown::empty(base, true));
        }

        let effective_base = match self.pricing_mode {
            PricingMode::Exclusive => base,
            PricingMode::Inclusive => self.derive_inclusive_base(base),
        };

        Ok(self.compute_exclusive(effective_base))
    }

    /// Extracts the pre-tax base out of a tax-inclusive amount:
    /// `base = ⌊given × 10000 / (10000 + Σ enabled percentage bps)⌋`.
    fn derive_inclusive_base(&self, given: Money) -> Money {
        let implied_bps: u64 = self
            .enabled_rules()
            .map(|r| match r.charge {
                TaxCharge::Percentage(rate) => rate.bps() as u64,
                TaxCharge::Fixed(_) => 0, // rejected earlier in compute()
            })
            .sum();

        let units = (given.minor_units() as i128 * 10_000).div_euclid(10_000 + implied_bps as i128);
        Money::from_minor(units as i64, given.currency())
    }

    fn compute_exclusive(&self, base: Money) -> TaxBreakdown {
        let mut lines = Vec::new();
        let mut total_tax = Money::zero(base.currency());

        for rule in self.enabled_rules() {
            let taxable = if rule.applies_after_other_taxes {
                base + total_tax
            } else {
                base
            };

            let (rate, tax_amount) = match rule.charge {
                TaxCharge::Percentage(rate) => (Some(rate), taxable.percentage_of(rate)),
                TaxCharge::Fixed(amount) => (None, amount),
            };

            lines.push(TaxLine {
                kind: rule.kind,
                rate,
                taxable_amount: taxable,
                tax_amount,
            });
            total_tax += tax_amount;
        }

        TaxBreakdown {
            lines,
            total_tax,
            effective_base: base,
            no_rules_enabled: false,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
