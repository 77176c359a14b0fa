//! # Coupons
//!
//! Discount coupon records, the directory they are looked up in, and the
//! ledger that validates, applies, stacks, and removes them.
//!
//! ## Application State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Unvalidated ──validate()──► Valid ──apply()──► Applied                │
//! │        │                        │                   │                   │
//! │        │                        │ re-validated      ├──remove()──►      │
//! │        ▼                        │ inside apply()    │    Removed        │
//! │   CouponError                   ▼                   │                   │
//! │   (NotFound, Expired,      CouponError              └──newer result──►  │
//! │    BelowMinimum, ...)      (never trusts a              Superseded      │
//! │                             stale validation)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//! Every discount is computed against the ORIGINAL order subtotal, never a
//! running discounted balance. Applying A then B therefore always equals
//! B then A, and the stacked total is clamped at the subtotal afterwards.
//!
//! The ledger only *reads* coupons. Usage counters are committed by the
//! backend when checkout finalizes, outside this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::error::{CouponError, ValidationError};
use crate::money::{Currency, Money, Rate};
use crate::order::{ItemType, OrderSnapshot};
use crate::validation::{validate_coupon_code, validate_uuid};

// =============================================================================
// Coupon Record
// =============================================================================

/// Administrative lifecycle state of a coupon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CouponStatus {
    Active,
    Inactive,
    Expired,
    Suspended,
    Draft,
}

/// How a coupon discounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CouponKind {
    /// Percentage of the order subtotal, optionally capped.
    Percentage {
        rate: Rate,
        #[serde(rename = "maxDiscount")]
        max_discount: Option<Money>,
    },
    /// Fixed amount, capped at the order subtotal.
    FixedAmount { amount: Money },
}

/// Which items a coupon is willing to discount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "scope", content = "values", rename_all = "snake_case")]
pub enum Applicability {
    /// Any order.
    All,
    /// Orders containing at least one item of these types.
    ItemTypes(Vec<ItemType>),
    /// Orders containing at least one of these exact items.
    Items(Vec<String>),
}

/// A coupon as the registry reports it: identity, discount shape, and the
/// constraints the ledger checks on every application.
///
/// `times_used_*` are the registry's current counters, snapshotted at fetch
/// time; this crate never increments them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    /// Registry id (UUID v4).
    pub id: String,

    /// Redemption code. Unique, case-insensitive.
    pub code: String,

    pub kind: CouponKind,

    /// Orders below this subtotal are rejected.
    pub minimum_order_amount: Option<Money>,

    #[ts(as = "Option<String>")]
    pub valid_from: Option<DateTime<Utc>>,

    #[ts(as = "Option<String>")]
    pub valid_until: Option<DateTime<Utc>>,

    pub usage_limit_total: Option<u32>,
    pub usage_limit_per_user: Option<u32>,
    pub times_used_total: u32,
    pub times_used_by_user: u32,

    pub applicable_to: Applicability,

    /// Whether this coupon tolerates other coupons on the same order.
    pub combinable: bool,

    pub status: CouponStatus,
}

/// Canonical form of a code for lookup and uniqueness: trimmed, uppercased.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

// =============================================================================
// Coupon Directory
// =============================================================================

/// Case-insensitive code → coupon lookup.
///
/// A snapshot of the registry's view, fed by the validation boundary and
/// read by the ledger. Never authoritative for usage counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CouponDirectory {
    coupons: HashMap<String, Coupon>,
}

impl CouponDirectory {
    pub fn new() -> Self {
        CouponDirectory::default()
    }

    /// Inserts or refreshes a coupon.
    ///
    /// Re-inserting the same coupon id under the same code replaces the
    /// stored record (registry refresh). A *different* coupon claiming an
    /// existing code is rejected - codes are unique platform-wide.
    pub fn insert(&mut self, coupon: Coupon) -> Result<(), ValidationError> {
        validate_uuid(&coupon.id)?;
        validate_coupon_code(&coupon.code)?;

        let key = normalize_code(&coupon.code);
        if let Some(existing) = self.coupons.get(&key) {
            if existing.id != coupon.id {
                return Err(ValidationError::Duplicate {
                    field: "coupon code".to_string(),
                    value: coupon.code,
                });
            }
        }

        self.coupons.insert(key, coupon);
        Ok(())
    }

    /// Looks a coupon up by code, case-insensitively.
    pub fn get(&self, code: &str) -> Option<&Coupon> {
        self.coupons.get(&normalize_code(code))
    }

    pub fn len(&self) -> usize {
        self.coupons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coupons.is_empty()
    }
}

impl FromIterator<Coupon> for CouponDirectory {
    /// Builds a directory from trusted records, skipping any that fail
    /// shape validation.
    fn from_iter<T: IntoIterator<Item = Coupon>>(iter: T) -> Self {
        let mut dir = CouponDirectory::new();
        for coupon in iter {
            let _ = dir.insert(coupon);
        }
        dir
    }
}

// =============================================================================
// Applied Coupons
// =============================================================================

/// A successfully validated discount, ready to be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponCandidate {
    pub coupon_id: String,
    pub code: String,
    pub discount: Money,
    pub combinable: bool,
}

/// A coupon the ledger has accepted for the current order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AppliedCoupon {
    pub coupon_id: String,
    /// The code as the registry spells it.
    pub code: String,
    pub discount_amount: Money,
    #[ts(as = "String")]
    pub applied_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct AppliedEntry {
    applied: AppliedCoupon,
    combinable: bool,
}

// =============================================================================
// Coupon Ledger
// =============================================================================

/// Tracks the coupons applied to one order and their stacked total.
///
/// ## Invariants
/// - no two entries share a code (case-insensitive)
/// - a non-combinable coupon is always alone
/// - `discount_total ≤ order.subtotal`, whatever is stacked
///
/// ## Versioning
/// Every mutation bumps `version()`. The async validation boundary stamps
/// in-flight validations with the version it observed and discards results
/// whose stamp no longer matches - a validation that raced a removal must
/// not resurrect state the user already moved past.
#[derive(Debug, Clone)]
pub struct CouponLedger {
    currency: Currency,
    entries: Vec<AppliedEntry>,
    discount_total: Money,
    /// Subtotal of the order the entries were applied against; the clamp
    /// ceiling for `discount_total` once apply() has seen the order.
    applied_against: Option<Money>,
    version: u64,
}

impl CouponLedger {
    /// An empty ledger for orders in the given currency.
    pub fn new(currency: Currency) -> Self {
        CouponLedger {
            currency,
            entries: Vec::new(),
            discount_total: Money::zero(currency),
            applied_against: None,
            version: 0,
        }
    }

    /// Monotonically increasing mutation counter.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The applied coupons, in application order.
    pub fn applied(&self) -> Vec<AppliedCoupon> {
        self.entries.iter().map(|e| e.applied.clone()).collect()
    }

    /// Stacked discount, clamped at the subtotal it was applied against.
    #[inline]
    pub fn discount_total(&self) -> Money {
        self.discount_total
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Validates a code against the directory and the order, computing the
    /// discount candidate without touching ledger state.
    ///
    /// ## Rejections
    /// - `NotFound` - unknown code, or draft/inactive/suspended status
    /// - `Expired` - expired status, or outside `[valid_from, valid_until]`
    /// - `UsageExceeded` - total or per-user counter at its limit
    /// - `BelowMinimum` - subtotal under the coupon's minimum
    /// - `NotApplicable` - no matching item, or foreign-currency coupon
    pub fn validate(
        &self,
        directory: &CouponDirectory,
        code: &str,
        order: &OrderSnapshot,
        now: DateTime<Utc>,
    ) -> Result<CouponCandidate, CouponError> {
        let code = code.trim();
        let not_found = || CouponError::NotFound {
            code: code.to_string(),
        };

        let coupon = directory.get(code).ok_or_else(not_found)?;

        match coupon.status {
            CouponStatus::Active => {}
            CouponStatus::Expired => {
                return Err(CouponError::Expired {
                    code: code.to_string(),
                })
            }
            // Not publicly redeemable; indistinguishable from unknown on
            // purpose (a suspended campaign should not leak its existence).
            CouponStatus::Inactive | CouponStatus::Suspended | CouponStatus::Draft => {
                return Err(not_found())
            }
        }

        let in_window = coupon.valid_from.map_or(true, |from| now >= from)
            && coupon.valid_until.map_or(true, |until| now <= until);
        if !in_window {
            return Err(CouponError::Expired {
                code: code.to_string(),
            });
        }

        let total_exhausted = coupon
            .usage_limit_total
            .is_some_and(|limit| coupon.times_used_total >= limit);
        let user_exhausted = coupon
            .usage_limit_per_user
            .is_some_and(|limit| coupon.times_used_by_user >= limit);
        if total_exhausted || user_exhausted {
            return Err(CouponError::UsageExceeded {
                code: code.to_string(),
            });
        }

        let subtotal = order.subtotal();

        if let Some(minimum) = coupon.minimum_order_amount {
            if minimum.currency() != subtotal.currency() {
                return Err(CouponError::NotApplicable {
                    code: code.to_string(),
                });
            }
            if subtotal < minimum {
                return Err(CouponError::BelowMinimum {
                    code: code.to_string(),
                    minimum,
                    subtotal,
                });
            }
        }

        let applicable = match &coupon.applicable_to {
            Applicability::All => true,
            Applicability::ItemTypes(types) => {
                types.iter().any(|t| order.contains_item_type(*t))
            }
            Applicability::Items(ids) => order.contains_any_item(ids),
        };
        if !applicable {
            return Err(CouponError::NotApplicable {
                code: code.to_string(),
            });
        }

        let discount = match &coupon.kind {
            CouponKind::Percentage { rate, max_discount } => {
                let raw = subtotal.percentage_of(*rate);
                match max_discount {
                    Some(cap) if cap.currency() == subtotal.currency() => raw.min(*cap),
                    Some(_) => {
                        return Err(CouponError::NotApplicable {
                            code: code.to_string(),
                        })
                    }
                    None => raw,
                }
            }
            CouponKind::FixedAmount { amount } => {
                if amount.currency() != subtotal.currency() {
                    return Err(CouponError::NotApplicable {
                        code: code.to_string(),
                    });
                }
                (*amount).min(subtotal)
            }
        };

        Ok(CouponCandidate {
            coupon_id: coupon.id.clone(),
            code: coupon.code.clone(),
            discount,
            combinable: coupon.combinable,
        })
    }

    /// Re-validates and applies a code.
    ///
    /// A previously obtained `CouponCandidate` is never trusted here - the
    /// directory or the order may have changed since it was computed.
    pub fn apply(
        &mut self,
        directory: &CouponDirectory,
        code: &str,
        order: &OrderSnapshot,
        now: DateTime<Utc>,
    ) -> Result<AppliedCoupon, CouponError> {
        debug_assert_eq!(self.currency, order.subtotal().currency());

        let normalized = normalize_code(code);
        if self
            .entries
            .iter()
            .any(|e| normalize_code(&e.applied.code) == normalized)
        {
            return Err(CouponError::Conflict {
                code: code.trim().to_string(),
            });
        }

        let candidate = self.validate(directory, code, order, now)?;

        let blocked = !self.entries.is_empty()
            && (!candidate.combinable || self.entries.iter().any(|e| !e.combinable));
        if blocked {
            return Err(CouponError::Conflict {
                code: candidate.code,
            });
        }

        let applied = AppliedCoupon {
            coupon_id: candidate.coupon_id,
            code: candidate.code,
            discount_amount: candidate.discount,
            applied_at: now,
        };
        self.entries.push(AppliedEntry {
            applied: applied.clone(),
            combinable: candidate.combinable,
        });
        self.applied_against = Some(order.subtotal());
        self.recompute_total();
        self.version += 1;

        Ok(applied)
    }

    /// Removes an applied coupon by id. Removing an id that is not applied
    /// is a no-op - removal never fails.
    pub fn remove(&mut self, coupon_id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.applied.coupon_id != coupon_id);
        if self.entries.len() == before {
            return false;
        }

        self.recompute_total();
        self.version += 1;
        true
    }

    /// Drops every applied coupon.
    pub fn clear(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        self.entries.clear();
        self.discount_total = Money::zero(self.currency);
        self.applied_against = None;
        self.version += 1;
    }

    fn raw_sum(&self) -> Money {
        self.entries
            .iter()
            .fold(Money::zero(self.currency), |acc, e| {
                acc + e.applied.discount_amount
            })
    }

    /// Clamp the stacked sum at the subtotal it was applied against.
    fn recompute_total(&mut self) {
        let sum = self.raw_sum();
        self.discount_total = match self.applied_against {
            Some(cap) => sum.min(cap),
            None => sum,
        };
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::LineItem;
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

    fn coupon(id_suffix: u32, code: &str, kind: CouponKind) -> Coupon {
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
            combinable: true,
            status: CouponStatus::Active,
        }
    }

    fn percent(id: u32, code: &str, pct: u32) -> Coupon {
        coupon(
            id,
            code,
            CouponKind::Percentage {
                rate: Rate::from_percent(pct),
                max_discount: None,
            },
        )
    }

    fn fixed(id: u32, code: &str, amount: i64) -> Coupon {
        coupon(
            id,
            code,
            CouponKind::FixedAmount {
                amount: Money::irt(amount),
            },
        )
    }

    fn directory(coupons: Vec<Coupon>) -> CouponDirectory {
        let mut dir = CouponDirectory::new();
        for c in coupons {
            dir.insert(c).unwrap();
        }
        dir
    }

    #[test]
    fn test_percentage_discount_applied() {
        let dir = directory(vec![percent(1, "WELCOME10", 10)]);
        let mut ledger = CouponLedger::new(Currency::Irt);
        let order = order(1_000_000);

        let applied = ledger.apply(&dir, "WELCOME10", &order, now()).unwrap();
        assert_eq!(applied.discount_amount.minor_units(), 100_000);
        assert_eq!(ledger.discount_total().minor_units(), 100_000);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_percentage_cap() {
        let mut c = percent(1, "BIG50", 50);
        c.kind = CouponKind::Percentage {
            rate: Rate::from_percent(50),
            max_discount: Some(Money::irt(100_000)),
        };
        let dir = directory(vec![c]);
        let ledger = CouponLedger::new(Currency::Irt);

        let candidate = ledger.validate(&dir, "BIG50", &order(1_000_000), now()).unwrap();
        assert_eq!(candidate.discount.minor_units(), 100_000);
    }

    #[test]
    fn test_fixed_discount_capped_at_subtotal() {
        let dir = directory(vec![fixed(1, "SAVE50000", 50_000)]);
        let ledger = CouponLedger::new(Currency::Irt);

        let candidate = ledger.validate(&dir, "SAVE50000", &order(30_000), now()).unwrap();
        assert_eq!(candidate.discount.minor_units(), 30_000);
    }

    #[test]
    fn test_code_lookup_is_case_insensitive() {
        let dir = directory(vec![percent(1, "WELCOME10", 10)]);
        let mut ledger = CouponLedger::new(Currency::Irt);
        let order = order(1_000_000);

        let applied = ledger.apply(&dir, "welcome10", &order, now()).unwrap();
        assert_eq!(applied.code, "WELCOME10");

        // the same code in another casing is a duplicate, not a new coupon
        let err = ledger.apply(&dir, "Welcome10", &order, now()).unwrap_err();
        assert!(matches!(err, CouponError::Conflict { .. }));
    }

    #[test]
    fn test_unknown_code() {
        let dir = directory(vec![]);
        let ledger = CouponLedger::new(Currency::Irt);
        let err = ledger.validate(&dir, "GHOST", &order(1_000), now()).unwrap_err();
        assert!(matches!(err, CouponError::NotFound { .. }));
    }

    #[test]
    fn test_non_public_statuses_read_as_not_found() {
        for status in [CouponStatus::Draft, CouponStatus::Inactive, CouponStatus::Suspended] {
            let mut c = percent(1, "HIDDEN", 10);
            c.status = status;
            let dir = directory(vec![c]);
            let ledger = CouponLedger::new(Currency::Irt);

            let err = ledger.validate(&dir, "HIDDEN", &order(1_000), now()).unwrap_err();
            assert!(matches!(err, CouponError::NotFound { .. }), "{status:?}");
        }
    }

    #[test]
    fn test_validity_window() {
        let mut c = percent(1, "EARLY", 10);
        c.valid_from = Some(Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap());
        let mut d = percent(2, "LATE", 10);
        d.valid_until = Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());
        let mut e = percent(3, "DEAD", 10);
        e.status = CouponStatus::Expired;

        let dir = directory(vec![c, d, e]);
        let ledger = CouponLedger::new(Currency::Irt);
        let order = order(1_000_000);

        for code in ["EARLY", "LATE", "DEAD"] {
            let err = ledger.validate(&dir, code, &order, now()).unwrap_err();
            assert!(matches!(err, CouponError::Expired { .. }), "{code}");
        }
    }

    #[test]
    fn test_usage_limits() {
        let mut c = percent(1, "POPULAR", 10);
        c.usage_limit_total = Some(100);
        c.times_used_total = 100;
        let mut d = percent(2, "ONCE", 10);
        d.usage_limit_per_user = Some(1);
        d.times_used_by_user = 1;

        let dir = directory(vec![c, d]);
        let ledger = CouponLedger::new(Currency::Irt);
        let order = order(1_000_000);

        for code in ["POPULAR", "ONCE"] {
            let err = ledger.validate(&dir, code, &order, now()).unwrap_err();
            assert!(matches!(err, CouponError::UsageExceeded { .. }), "{code}");
        }
    }

    #[test]
    fn test_below_minimum() {
        let mut c = percent(1, "BULK", 10);
        c.minimum_order_amount = Some(Money::irt(500_000));
        let dir = directory(vec![c]);
        let ledger = CouponLedger::new(Currency::Irt);

        let err = ledger.validate(&dir, "BULK", &order(100_000), now()).unwrap_err();
        assert!(matches!(err, CouponError::BelowMinimum { .. }));

        assert!(ledger.validate(&dir, "BULK", &order(500_000), now()).is_ok());
    }

    #[test]
    fn test_applicability_scopes() {
        let mut courses_only = percent(1, "COURSES", 10);
        courses_only.applicable_to = Applicability::ItemTypes(vec![ItemType::Workshop]);
        let mut exact = percent(2, "EXACT", 10);
        exact.applicable_to = Applicability::Items(vec!["go-201".to_string()]);

        let dir = directory(vec![courses_only, exact]);
        let ledger = CouponLedger::new(Currency::Irt);
        let order = order(1_000_000); // contains only course rust-101

        for code in ["COURSES", "EXACT"] {
            let err = ledger.validate(&dir, code, &order, now()).unwrap_err();
            assert!(matches!(err, CouponError::NotApplicable { .. }), "{code}");
        }
    }

    #[test]
    fn test_non_combinable_conflict_keeps_first() {
        let mut first20 = percent(2, "FIRST20", 20);
        first20.combinable = false;

        let dir = directory(vec![fixed(1, "SAVE50000", 50_000), first20]);
        let mut ledger = CouponLedger::new(Currency::Irt);
        let order = order(1_000_000);

        ledger.apply(&dir, "SAVE50000", &order, now()).unwrap();
        let err = ledger.apply(&dir, "FIRST20", &order, now()).unwrap_err();

        assert!(matches!(err, CouponError::Conflict { .. }));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.applied()[0].code, "SAVE50000");
    }

    #[test]
    fn test_non_combinable_blocks_later_coupons_too() {
        let mut solo = percent(1, "SOLO", 20);
        solo.combinable = false;

        let dir = directory(vec![solo, fixed(2, "EXTRA", 10_000)]);
        let mut ledger = CouponLedger::new(Currency::Irt);
        let order = order(1_000_000);

        ledger.apply(&dir, "SOLO", &order, now()).unwrap();
        let err = ledger.apply(&dir, "EXTRA", &order, now()).unwrap_err();
        assert!(matches!(err, CouponError::Conflict { .. }));
    }

    #[test]
    fn test_stacking_is_commutative() {
        let dir = directory(vec![percent(1, "TEN", 10), fixed(2, "FLAT", 70_000)]);
        let order = order(1_000_000);

        let mut ab = CouponLedger::new(Currency::Irt);
        ab.apply(&dir, "TEN", &order, now()).unwrap();
        ab.apply(&dir, "FLAT", &order, now()).unwrap();

        let mut ba = CouponLedger::new(Currency::Irt);
        ba.apply(&dir, "FLAT", &order, now()).unwrap();
        ba.apply(&dir, "TEN", &order, now()).unwrap();

        assert_eq!(ab.discount_total(), ba.discount_total());
        assert_eq!(ab.discount_total().minor_units(), 170_000);
    }

    #[test]
    fn test_stacked_total_clamped_at_subtotal() {
        let dir = directory(vec![fixed(1, "BIG1", 80_000), fixed(2, "BIG2", 90_000)]);
        let mut ledger = CouponLedger::new(Currency::Irt);
        let order = order(100_000);

        ledger.apply(&dir, "BIG1", &order, now()).unwrap();
        ledger.apply(&dir, "BIG2", &order, now()).unwrap();

        assert_eq!(ledger.discount_total().minor_units(), 100_000);
    }

    #[test]
    fn test_remove_recomputes_and_never_fails() {
        let dir = directory(vec![percent(1, "TEN", 10), fixed(2, "FLAT", 70_000)]);
        let mut ledger = CouponLedger::new(Currency::Irt);
        let order = order(1_000_000);

        let ten = ledger.apply(&dir, "TEN", &order, now()).unwrap();
        ledger.apply(&dir, "FLAT", &order, now()).unwrap();

        assert!(ledger.remove(&ten.coupon_id));
        assert_eq!(ledger.discount_total().minor_units(), 70_000);

        // removing again is a no-op
        assert!(!ledger.remove(&ten.coupon_id));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_version_bumps_on_every_mutation() {
        let dir = directory(vec![percent(1, "TEN", 10)]);
        let mut ledger = CouponLedger::new(Currency::Irt);
        let order = order(1_000_000);
        assert_eq!(ledger.version(), 0);

        let applied = ledger.apply(&dir, "TEN", &order, now()).unwrap();
        assert_eq!(ledger.version(), 1);

        ledger.remove(&applied.coupon_id);
        assert_eq!(ledger.version(), 2);

        // failed mutations and no-ops leave the version alone
        assert!(ledger.apply(&dir, "GHOST", &order, now()).is_err());
        ledger.clear();
        assert_eq!(ledger.version(), 2);
    }

    #[test]
    fn test_directory_rejects_conflicting_code() {
        let mut dir = directory(vec![percent(1, "TEN", 10)]);

        // same id: refresh
        assert!(dir.insert(percent(1, "TEN", 10)).is_ok());

        // different id claiming the same code (any casing): rejected
        let err = dir.insert(percent(2, "ten", 15)).unwrap_err();
        assert!(matches!(err, ValidationError::Duplicate { .. }));
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn test_foreign_currency_coupon_not_applicable() {
        let mut c = fixed(1, "USD5", 5);
        c.kind = CouponKind::FixedAmount {
            amount: Money::from_minor(5, crate::money::Currency::Usd),
        };
        let dir = directory(vec![c]);
        let ledger = CouponLedger::new(Currency::Irt);

        let err = ledger.validate(&dir, "USD5", &order(1_000_000), now()).unwrap_err();
        assert!(matches!(err, CouponError::NotApplicable { .. }));
    }
}
