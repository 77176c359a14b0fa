//! # caspian-client: Async Collaborator Boundary for Caspian Checkout
//!
//! Everything network-shaped lives here: the service traits the embedding
//! application implements, and the timing machinery (debounce, single-flight,
//! TTL caching, deadlines) that keeps those services from degrading the
//! checkout experience. The arithmetic itself stays in `caspian-core`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 caspian-client Responsibilities                         │
//! │                                                                         │
//! │  Storefront backend / UI commands                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  CheckoutSession (session)                                      │   │
//! │  │    serialized ledger mutations, fresh quote per command         │   │
//! │  │     │                │                    │                     │   │
//! │  │     ▼                ▼                    ▼                     │   │
//! │  │  CouponValidator  GatewayCatalogCache  WalletService            │   │
//! │  │  (validator)      (catalog)            (services)               │   │
//! │  │   debounce 300ms   TTL 60s              balance per refresh     │   │
//! │  │   single-flight    serve-stale                                  │   │
//! │  │   deadline 8s      coalesced refresh                            │   │
//! │  └─────────────────────────────────┬───────────────────────────────┘   │
//! │                                    │                                    │
//! │                                    ▼                                    │
//! │                     caspian-core::PricingPipeline                       │
//! │                     (pure, deterministic, no I/O)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`services`] - collaborator traits ([`CouponRegistry`],
//!   [`GatewayStatusService`], [`WalletService`]) and their DTOs
//! - [`validator`] - debounced, single-flight coupon validation
//! - [`catalog`] - TTL-bounded gateway catalog cache
//! - [`session`] - the [`CheckoutSession`] command surface
//! - [`config`] - timing knobs
//! - [`error`] - client-side error taxonomy
//!
//! ## Design Principles
//!
//! 1. **Nothing pends forever**: every collaborator call carries a deadline
//!    and maps expiry to a typed, retryable error
//! 2. **Stale results never apply**: outcomes are stamped with a trigger
//!    generation and a ledger version; mismatches are dropped, not applied
//! 3. **No retries here**: the client classifies errors as retryable or
//!    not; retry policy belongs to the caller
//! 4. **Degrade, don't block**: a stale gateway catalog or an unreachable
//!    wallet annotates the quote instead of failing it

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod config;
pub mod error;
pub mod services;
pub mod session;
pub mod validator;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use catalog::GatewayCatalogCache;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use services::{CouponCheck, CouponCommit, CouponRegistry, GatewayStatusService, WalletService};
pub use session::CheckoutSession;
pub use validator::{CouponValidator, ValidationOutcome};
