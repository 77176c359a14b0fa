//! # caspian-core: Pure Pricing Logic for Caspian Checkout
//!
//! This crate is the **heart** of the checkout: everything between a cart
//! subtotal and a payable amount, as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Caspian Checkout Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Storefront Frontend (TypeScript)                │   │
//! │  │    Cart UI ──► Coupon field ──► Payment picker ──► Submit      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              caspian-client (async boundary)                    │   │
//! │  │    debounced validation, gateway catalog cache, sessions        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ caspian-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ │   │
//! │  │   │  money  │ │   tax   │ │ coupon  │ │ gateway │ │pipeline │ │   │
//! │  │   │  Money  │ │ RuleSet │ │ Ledger  │ │ Catalog │ │  Quote  │ │   │
//! │  │   │  Rate   │ │Breakdown│ │Directory│ │ Ranking │ │         │ │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO CLOCK READS • PURE FUNCTIONS        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - `Money` and `Rate` with integer, floor-only arithmetic
//! - [`order`] - the immutable `OrderSnapshot` a quote is computed against
//! - [`tax`] - configurable tax rules, exclusive and inclusive modes
//! - [`coupon`] - coupon records, directory, and the stacking ledger
//! - [`gateway`] - gateway descriptors and amount-aware ranking
//! - [`pipeline`] - the orchestrator producing a [`pipeline::PricingQuote`]
//! - [`error`] - domain error types
//! - [`validation`] - boundary input validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same inputs (time included) = same quote, byte
//!    for byte
//! 2. **No I/O**: network, storage, and clock access are FORBIDDEN here
//! 3. **Integer Money**: minor units (i64) everywhere; percentages floor,
//!    so the platform never overcharges by a rounding artifact
//! 4. **Explicit Errors**: recoverable problems annotate the quote, fatal
//!    ones abort it - nothing panics, nothing is stringly-typed
//!
//! ## Example Usage
//!
//! ```rust
//! use caspian_core::money::{Money, Rate};
//! use caspian_core::order::{ItemType, LineItem, OrderSnapshot};
//! use caspian_core::pipeline::{PricingPipeline, QuoteContext};
//! use caspian_core::tax::{PricingMode, TaxKind, TaxRule, TaxRuleSet};
//! use caspian_core::coupon::CouponDirectory;
//! use caspian_core::gateway::GatewayCatalog;
//! use chrono::Utc;
//!
//! let order = OrderSnapshot::new(
//!     Money::irt(1_000_000),
//!     vec![LineItem::new("rust-101", ItemType::Course, 1)],
//! )?;
//!
//! let pipeline = PricingPipeline::new(TaxRuleSet::new(
//!     vec![TaxRule::percentage(TaxKind::Vat, Rate::from_percent(9))],
//!     PricingMode::Exclusive,
//! ));
//!
//! let quote = pipeline.quote(
//!     &order,
//!     &[],
//!     &CouponDirectory::new(),
//!     &GatewayCatalog::default(),
//!     &QuoteContext::new(Utc::now()),
//! )?;
//!
//! assert_eq!(quote.grand_total.minor_units(), 1_090_000);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod coupon;
pub mod error;
pub mod gateway;
pub mod money;
pub mod order;
pub mod pipeline;
pub mod tax;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use caspian_core::Money` instead of
// `use caspian_core::money::Money`

pub use coupon::{AppliedCoupon, Coupon, CouponDirectory, CouponLedger};
pub use error::{
    ArithmeticError, CouponError, GatewayError, QuoteError, TaxConfigError, ValidationError,
};
pub use gateway::{GatewayCatalog, GatewayContext, GatewayDescriptor, GatewayType, RankedGateway};
pub use money::{Currency, Money, Rate};
pub use order::{ItemType, LineItem, OrderSnapshot};
pub use pipeline::{PricingPipeline, PricingQuote, QuoteContext, QuoteWarning};
pub use tax::{PricingMode, TaxBreakdown, TaxRuleSet};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single order snapshot
///
/// ## Business Reason
/// Prevents runaway carts and keeps quote payloads bounded.
/// Can be made configurable per-tenant in future versions.
pub const MAX_LINE_ITEMS: usize = 100;

/// Maximum quantity of a single line item
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum accepted length of a coupon code
///
/// Longer inputs are typos or abuse, not codes the admin panel can mint.
pub const MAX_COUPON_CODE_LENGTH: usize = 64;
