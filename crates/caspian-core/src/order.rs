//! # Order Snapshot
//!
//! The immutable order input to one pricing calculation.
//!
//! ## Snapshot Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Checkout UI state (mutable, lives in the frontend)                     │
//! │       │                                                                 │
//! │       ▼  one checkout attempt                                           │
//! │  OrderSnapshot (frozen subtotal + line items)                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PricingPipeline::quote(...)  - reads, never mutates                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PricingQuote - discarded together with the snapshot afterwards         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A snapshot is validated once at construction; everything downstream
//! consumes it without re-checking.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::{validate_line_item_count, validate_quantity, validate_subtotal};

// =============================================================================
// Item Type
// =============================================================================

/// What kind of catalog entry a line item refers to.
///
/// Coupons can be scoped to a subset of these (e.g. course-only promotions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Course,
    Workshop,
    Product,
}

// =============================================================================
// Line Item
// =============================================================================

/// A single cart line, frozen at checkout time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Catalog id of the item (minted by the admin backend).
    pub item_id: String,

    /// Catalog section the item belongs to.
    pub item_type: ItemType,

    /// Quantity purchased. Always positive.
    pub quantity: i64,

    /// Unit price at the time the item entered the cart, when the caller
    /// has it. Used only for boundary cross-checks; the subtotal on the
    /// snapshot is authoritative.
    pub unit_price: Option<Money>,
}

impl LineItem {
    /// Creates a line item without a price snapshot.
    pub fn new(item_id: impl Into<String>, item_type: ItemType, quantity: i64) -> Self {
        LineItem {
            item_id: item_id.into(),
            item_type,
            quantity,
            unit_price: None,
        }
    }
}

// =============================================================================
// Order Snapshot
// =============================================================================

/// The frozen order a quote is computed against.
///
/// ## Invariants
/// - `subtotal` is non-negative
/// - every line quantity is within bounds
/// - every `unit_price` snapshot shares the subtotal's currency
/// - at most `MAX_LINE_ITEMS` lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderSnapshot {
    subtotal: Money,
    items: Vec<LineItem>,
}

impl OrderSnapshot {
    /// Builds a snapshot, rejecting malformed input before any pricing runs.
    pub fn new(subtotal: Money, items: Vec<LineItem>) -> Result<Self, ValidationError> {
        validate_subtotal(subtotal)?;
        validate_line_item_count(items.len())?;

        for item in &items {
            if item.item_id.trim().is_empty() {
                return Err(ValidationError::Required {
                    field: "item_id".to_string(),
                });
            }
            validate_quantity(item.quantity)?;

            if let Some(price) = item.unit_price {
                if price.currency() != subtotal.currency() {
                    return Err(ValidationError::CurrencyMismatch {
                        field: format!("unit_price of {}", item.item_id),
                        expected: subtotal.currency(),
                        found: price.currency(),
                    });
                }
                if price.is_negative() {
                    return Err(ValidationError::MustBePositive {
                        field: format!("unit_price of {}", item.item_id),
                    });
                }
            }
        }

        Ok(OrderSnapshot { subtotal, items })
    }

    /// The frozen subtotal.
    #[inline]
    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    /// The frozen cart lines.
    #[inline]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// True when the order has no lines.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True when any line matches the given item type.
    pub fn contains_item_type(&self, item_type: ItemType) -> bool {
        self.items.iter().any(|i| i.item_type == item_type)
    }

    /// True when any line matches one of the given item ids.
    pub fn contains_any_item(&self, item_ids: &[String]) -> bool {
        self.items
            .iter()
            .any(|i| item_ids.iter().any(|id| id == &i.item_id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
