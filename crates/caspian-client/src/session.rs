//! # Checkout Session
//!
//! One user's checkout attempt: the applied-coupon ledger, the cached
//! gateway catalog, and the commands the UI drives.
//!
//! ## Command Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    CheckoutSession Commands                             │
//! │                                                                         │
//! │  UI Action             Command                 Effect                   │
//! │  ─────────             ───────                 ──────                   │
//! │  Enter coupon ───────► add_coupon() ─────────► validate → apply →       │
//! │                                                fresh PricingQuote       │
//! │  Remove coupon ──────► remove_coupon() ──────► ledger.remove → quote    │
//! │  Clear coupons ──────► clear_coupons() ──────► ledger.clear → quote     │
//! │  "Update balance" ───► refresh_gateways() ───► wallet + catalog fetch   │
//! │  Pick gateway ───────► set_preferred_gateway() → re-ranked quote        │
//! │  (re)render totals ──► quote() ──────────────► read-only quote          │
//! │                                                                         │
//! │  LOCKING: ledger mutations are serialized behind one async Mutex -      │
//! │  the ledger is not reentrant. Network calls (validation, catalog        │
//! │  fetch) happen OUTSIDE the lock so a slow registry never freezes        │
//! │  the other commands.                                                    │
//! │                                                                         │
//! │  STALENESS: a validation outcome is applied only if (a) the ledger      │
//! │  version it was stamped with still matches and (b) no newer             │
//! │  validation was triggered meanwhile. Anything else is dropped with      │
//! │  a debug log, never applied late.                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use caspian_core::coupon::{CouponDirectory, CouponLedger};
use caspian_core::error::CouponError;
use caspian_core::gateway::{GatewayCatalog, GatewayType};
use caspian_core::money::Money;
use caspian_core::order::OrderSnapshot;
use caspian_core::pipeline::{PricingPipeline, PricingQuote, QuoteContext};

use crate::catalog::GatewayCatalogCache;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::services::{CouponRegistry, GatewayStatusService, WalletService};
use crate::validator::CouponValidator;

// =============================================================================
// Session State
// =============================================================================

/// Everything a command may mutate, behind one lock.
struct SessionState {
    /// Locally cached coupon records, fed by validation results.
    directory: CouponDirectory,

    /// The applied coupons for this order.
    ledger: CouponLedger,

    /// Wallet balance as last fetched. `None` until the first successful
    /// refresh - the wallet gateway ranks unavailable until then.
    wallet_balance: Option<Money>,

    /// The gateway the user picked, if any.
    preferred_gateway: Option<GatewayType>,
}

// =============================================================================
// Checkout Session
// =============================================================================

/// Drives one checkout attempt against a frozen [`OrderSnapshot`].
///
/// The session owns the only mutable state at the boundary; every command
/// returns a freshly computed [`PricingQuote`] so the UI always renders a
/// consistent snapshot, never a patched one.
pub struct CheckoutSession {
    order: OrderSnapshot,
    user_id: String,
    pipeline: PricingPipeline,
    validator: Arc<CouponValidator>,
    catalog: GatewayCatalogCache,
    wallet: Arc<dyn WalletService>,
    state: Mutex<SessionState>,
}

impl CheckoutSession {
    /// Creates a session for one checkout attempt.
    pub fn new(
        order: OrderSnapshot,
        user_id: impl Into<String>,
        pipeline: PricingPipeline,
        registry: Arc<dyn CouponRegistry>,
        gateways: Arc<dyn GatewayStatusService>,
        wallet: Arc<dyn WalletService>,
        config: ClientConfig,
    ) -> ClientResult<Self> {
        let currency = order.subtotal().currency();

        Ok(CheckoutSession {
            order,
            user_id: user_id.into(),
            pipeline,
            validator: Arc::new(CouponValidator::new(registry, config.clone())?),
            catalog: GatewayCatalogCache::new(gateways, config)?,
            wallet,
            state: Mutex::new(SessionState {
                directory: CouponDirectory::new(),
                ledger: CouponLedger::new(currency),
                wallet_balance: None,
                preferred_gateway: None,
            }),
        })
    }

    /// The frozen order this session prices.
    pub fn order(&self) -> &OrderSnapshot {
        &self.order
    }

    // =========================================================================
    // Coupon Commands
    // =========================================================================

    /// Validates a code against the registry and applies it to the ledger.
    ///
    /// The registry call runs debounced and single-flight, outside the
    /// state lock. Its outcome is applied only if the ledger has not moved
    /// on and no newer validation was triggered while it was in flight.
    pub async fn add_coupon(&self, code: &str) -> ClientResult<PricingQuote> {
        debug!(code, "add_coupon");

        let observed_version = self.state.lock().await.ledger.version();
        let outcome = self
            .validator
            .validate(code, &self.order, observed_version)
            .await?;

        // Fetch the catalog before taking the lock; the quote needs it and
        // the fetch must not serialize against other commands.
        let catalog = self.catalog.get(self.order.subtotal()).await?;

        let mut state = self.state.lock().await;
        let state = &mut *state;

        if state.ledger.version() != outcome.ledger_version {
            debug!(
                code = %outcome.code,
                stamped = outcome.ledger_version,
                current = state.ledger.version(),
                "dropping validation result, ledger moved on"
            );
            return Err(ClientError::Superseded);
        }
        if !self.validator.is_current(&outcome) {
            debug!(code = %outcome.code, "dropping validation result, newer request exists");
            return Err(ClientError::Superseded);
        }

        if !outcome.check.is_valid {
            let reason = outcome.check.error.unwrap_or(CouponError::NotFound {
                code: outcome.code.clone(),
            });
            return Err(reason.into());
        }

        let coupon = outcome.check.coupon.ok_or_else(|| {
            ClientError::Service("registry marked the code valid but sent no coupon record".into())
        })?;

        state
            .directory
            .insert(coupon)
            .map_err(|e| ClientError::Service(e.to_string()))?;

        // Re-validates locally; the registry's yes is necessary, not
        // sufficient (combinability and clamping are ledger rules).
        state
            .ledger
            .apply(&state.directory, &outcome.code, &self.order, Utc::now())?;

        self.build_quote(state, &catalog)
    }

    /// Removes an applied coupon and returns the recomputed quote.
    pub async fn remove_coupon(&self, coupon_id: &str) -> ClientResult<PricingQuote> {
        debug!(coupon_id, "remove_coupon");

        let catalog = self.catalog.get(self.order.subtotal()).await?;
        let mut state = self.state.lock().await;
        state.ledger.remove(coupon_id);
        self.build_quote(&state, &catalog)
    }

    /// Drops every applied coupon and returns the recomputed quote.
    pub async fn clear_coupons(&self) -> ClientResult<PricingQuote> {
        debug!("clear_coupons");

        let catalog = self.catalog.get(self.order.subtotal()).await?;
        let mut state = self.state.lock().await;
        state.ledger.clear();
        self.build_quote(&state, &catalog)
    }

    // =========================================================================
    // Gateway Commands
    // =========================================================================

    /// Forces a catalog fetch and a wallet balance fetch, then requotes.
    ///
    /// Backs the user-facing "update balance" action. A failing wallet
    /// service degrades to an unavailable wallet gateway rather than
    /// failing the whole command.
    pub async fn refresh_gateways(&self) -> ClientResult<PricingQuote> {
        debug!("refresh_gateways");

        let balance = match self.wallet.balance(&self.user_id).await {
            Ok(balance) => Some(balance),
            Err(err) => {
                warn!(error = %err, "wallet balance fetch failed, wallet gateway ranks unavailable");
                None
            }
        };

        let catalog = self.catalog.refresh(self.order.subtotal()).await?;

        let mut state = self.state.lock().await;
        state.wallet_balance = balance;
        self.build_quote(&state, &catalog)
    }

    /// Records the user's gateway choice and returns the re-ranked quote.
    pub async fn set_preferred_gateway(
        &self,
        gateway: Option<GatewayType>,
    ) -> ClientResult<PricingQuote> {
        let catalog = self.catalog.get(self.order.subtotal()).await?;
        let mut state = self.state.lock().await;
        state.preferred_gateway = gateway;
        self.build_quote(&state, &catalog)
    }

    // =========================================================================
    // Quoting
    // =========================================================================

    /// Computes a quote from the current session state without mutating it.
    pub async fn quote(&self) -> ClientResult<PricingQuote> {
        let catalog = self.catalog.get(self.order.subtotal()).await?;
        let state = self.state.lock().await;
        self.build_quote(&state, &catalog)
    }

    /// Runs the pure pipeline over the session's applied codes.
    ///
    /// The ledger has already filtered out rejected codes, so the pipeline
    /// sees only appliable ones; interactive rejections surfaced earlier as
    /// command errors.
    fn build_quote(
        &self,
        state: &SessionState,
        catalog: &GatewayCatalog,
    ) -> ClientResult<PricingQuote> {
        let codes: Vec<String> = state
            .ledger
            .applied()
            .iter()
            .map(|c| c.code.clone())
            .collect();

        let ctx = QuoteContext {
            now: Utc::now(),
            preferred_gateway: state.preferred_gateway.clone(),
            wallet_balance: state.wallet_balance,
        };

        Ok(self
            .pipeline
            .quote(&self.order, &codes, &state.directory, catalog, &ctx)?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
