//! # Money Module
//!
//! Provides the `Money` and `Rate` types for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: integer minor units (Toman for the primary storefront)  │
//! │    1,000,000 × 9% = 90,000 exactly                                     │
//! │    1,000,001 × 9% = 90,000.09 → floored to 90,000                      │
//! │                                                                         │
//! │  Percentages FLOOR, never round up: when a minor unit must be lost,    │
//! │  the customer keeps it. We undercharge by at most one unit; we never   │
//! │  overcharge.                                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use caspian_core::money::{Money, Rate};
//!
//! let subtotal = Money::irt(1_000_000);
//! let vat = subtotal.percentage_of(Rate::from_percent(9));
//! assert_eq!(vat.minor_units(), 90_000);
//!
//! // NEVER do this:
//! // let bad = Money::from_float(10.99); // NO SUCH METHOD EXISTS!
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign};
use ts_rs::TS;

// =============================================================================
// Currency
// =============================================================================

/// The currencies the storefront quotes in.
///
/// Closed set on purpose: every descriptor, rule, and coupon is validated
/// against the order currency once at the boundary, then consumed without
/// further checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Iranian Toman - the primary storefront currency. One minor unit = 1 Toman.
    Irt,
    /// Iranian Rial.
    Irr,
    /// US Dollar - used by the crypto/international checkout path.
    Usd,
}

impl Currency {
    /// Returns the currency code used on the wire.
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Currency::Irt => "IRT",
            Currency::Irr => "IRR",
            Currency::Usd => "USD",
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::Irt
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// =============================================================================
// Money
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: refunds and adjustments exist upstream; arithmetic in
///   this crate keeps results non-negative (`saturating_sub` floors at zero)
/// - **Currency tagged**: mixing currencies in arithmetic is a programming
///   error, caught by `debug_assert` and by boundary validation
/// - **Derives**: full serde support for JSON quote payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money {
    amount: i64,
    currency: Currency,
}

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use caspian_core::money::{Currency, Money};
    ///
    /// let price = Money::from_minor(1_000_000, Currency::Irt);
    /// assert_eq!(price.minor_units(), 1_000_000);
    /// ```
    #[inline]
    pub const fn from_minor(amount: i64, currency: Currency) -> Self {
        Money { amount, currency }
    }

    /// Convenience constructor for Toman amounts.
    #[inline]
    pub const fn irt(amount: i64) -> Self {
        Money::from_minor(amount, Currency::Irt)
    }

    /// Returns zero in the given currency.
    #[inline]
    pub const fn zero(currency: Currency) -> Self {
        Money::from_minor(0, currency)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor_units(&self) -> i64 {
        self.amount
    }

    /// Returns the currency.
    #[inline]
    pub const fn currency(&self) -> Currency {
        self.currency
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.amount == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.amount > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.amount < 0
    }

    /// Subtracts, flooring at zero.
    ///
    /// A discount larger than what remains of an order never produces a
    /// negative amount - it consumes the remainder and stops.
    ///
    /// ## Example
    /// ```rust
    /// use caspian_core::money::Money;
    ///
    /// let subtotal = Money::irt(40_000);
    /// let discount = Money::irt(50_000);
    /// assert_eq!(subtotal.saturating_sub(discount).minor_units(), 0);
    /// ```
    #[inline]
    pub fn saturating_sub(self, other: Money) -> Money {
        debug_assert_eq!(self.currency, other.currency, "currency mismatch in subtract");
        Money {
            amount: (self.amount - other.amount).max(0),
            currency: self.currency,
        }
    }

    /// Applies a percentage rate, flooring the result.
    ///
    /// ## Flooring
    /// `floor(amount × rate)` - a fractional minor unit is always dropped,
    /// so percentage charges never exceed the exact value.
    ///
    /// ## Example
    /// ```rust
    /// use caspian_core::money::{Money, Rate};
    ///
    /// let base = Money::irt(1_000_001);
    /// let tax = base.percentage_of(Rate::from_percent(9));
    /// // 1,000,001 × 9% = 90,000.09 → 90,000
    /// assert_eq!(tax.minor_units(), 90_000);
    /// ```
    pub fn percentage_of(self, rate: Rate) -> Money {
        // i128 prevents overflow on large amounts; div_euclid floors for
        // any sign, unlike `/` which truncates toward zero.
        let units = (self.amount as i128 * rate.bps() as i128).div_euclid(10_000);
        Money {
            amount: units as i64,
            currency: self.currency,
        }
    }

    /// Returns the smaller of two amounts in the same currency.
    #[inline]
    pub fn min(self, other: Money) -> Money {
        if self <= other {
            self
        } else {
            other
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for logs and debugging. The frontend formats amounts itself to
/// handle localization (Persian digit grouping) properly.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency.code())
    }
}

/// Addition of two Money values in the same currency.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        debug_assert_eq!(self.currency, other.currency, "currency mismatch in add");
        Money {
            amount: self.amount + other.amount,
            currency: self.currency,
        }
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        debug_assert_eq!(self.currency, other.currency, "currency mismatch in add");
        self.amount += other.amount;
    }
}

/// Ordering compares amounts; comparing across currencies is a programming
/// error caught in debug builds.
impl PartialOrd for Money {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Money {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        debug_assert_eq!(self.currency, other.currency, "currency mismatch in compare");
        self.amount.cmp(&other.amount)
    }
}

// =============================================================================
// Rate
// =============================================================================

/// A percentage rate in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000. 900 bps = 9% (the standard VAT rate
/// here). Shared by tax rules, percentage coupons, and gateway fee
/// schedules so every percentage in the system floors the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rate(u32);

impl Rate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Creates a rate from a whole percentage (9 → 9%).
    #[inline]
    pub const fn from_percent(pct: u32) -> Self {
        Rate(pct * 100)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::zero()
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
