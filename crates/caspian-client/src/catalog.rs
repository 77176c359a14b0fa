//! # Gateway Catalog Cache
//!
//! TTL-bounded cache over the gateway status collaborator.
//!
//! ## Staleness Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Catalog Freshness Decisions                          │
//! │                                                                         │
//! │  get()                                                                  │
//! │  ├── snapshot fresh (within TTL) ───────► serve it, no network          │
//! │  ├── snapshot stale or missing ─────────► single-flight refresh         │
//! │  │     ├── refresh succeeds ────────────► store + serve new snapshot    │
//! │  │     ├── refresh fails, stale exists ─► serve the stale snapshot      │
//! │  │     └── refresh fails, nothing cached► GatewayUnavailable            │
//! │  │                                                                      │
//! │  refresh() (user-triggered "update balance")                            │
//! │  └── always fetches, bypassing the TTL check                            │
//! │                                                                         │
//! │  Concurrent refreshes coalesce behind one gate: the second caller       │
//! │  waits, re-checks, and reuses the first caller's result.                │
//! │                                                                         │
//! │  A quote is never blocked on a fresh catalog - momentarily stale        │
//! │  gateway health beats no quote at all.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::time::{timeout, Instant};
use tracing::{debug, warn};

use caspian_core::gateway::GatewayCatalog;
use caspian_core::money::Money;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::services::GatewayStatusService;

// =============================================================================
// Snapshot
// =============================================================================

struct Snapshot {
    catalog: GatewayCatalog,
    fetched_at: Instant,
}

impl Snapshot {
    fn is_fresh(&self, ttl: std::time::Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

// =============================================================================
// Gateway Catalog Cache
// =============================================================================

/// Caches the gateway catalog between pricing requests.
///
/// Health data inside a snapshot may be stale up to the configured TTL
/// (plus the collaborator's own TTL); the pricing core annotates rather
/// than drops, so a stale "healthy" at worst offers a gateway that fails
/// at payment initiation - it never mis-prices.
pub struct GatewayCatalogCache {
    service: Arc<dyn GatewayStatusService>,
    config: ClientConfig,
    snapshot: RwLock<Option<Snapshot>>,

    /// Serializes fetches so concurrent stale readers coalesce into one
    /// network call.
    refresh_gate: Mutex<()>,
}

impl GatewayCatalogCache {
    /// Creates a cache over a gateway status collaborator.
    pub fn new(service: Arc<dyn GatewayStatusService>, config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        Ok(GatewayCatalogCache {
            service,
            config,
            snapshot: RwLock::new(None),
            refresh_gate: Mutex::new(()),
        })
    }

    /// Returns a catalog, preferring the cached snapshot.
    ///
    /// Fresh snapshots are served without touching the network. Stale or
    /// missing ones trigger a single-flight refresh; if that refresh fails
    /// and a stale snapshot exists, the stale snapshot is served instead
    /// of failing the quote.
    pub async fn get(&self, amount: Money) -> ClientResult<GatewayCatalog> {
        if let Some(snap) = self.snapshot.read().await.as_ref() {
            if snap.is_fresh(self.config.catalog_ttl()) {
                return Ok(snap.catalog.clone());
            }
        }

        self.fetch(amount, true).await
    }

    /// Forces a fetch, bypassing the TTL check.
    ///
    /// Backs the user-facing "update balance / refresh gateways" action.
    pub async fn refresh(&self, amount: Money) -> ClientResult<GatewayCatalog> {
        self.fetch(amount, false).await
    }

    /// True when a snapshot exists and is within its TTL.
    pub async fn is_fresh(&self) -> bool {
        self.snapshot
            .read()
            .await
            .as_ref()
            .is_some_and(|s| s.is_fresh(self.config.catalog_ttl()))
    }

    async fn fetch(&self, amount: Money, reuse_fresh: bool) -> ClientResult<GatewayCatalog> {
        let _gate = self.refresh_gate.lock().await;

        // Another caller may have refreshed while we waited on the gate.
        if reuse_fresh {
            if let Some(snap) = self.snapshot.read().await.as_ref() {
                if snap.is_fresh(self.config.catalog_ttl()) {
                    debug!("gateway catalog refreshed by a concurrent caller, reusing");
                    return Ok(snap.catalog.clone());
                }
            }
        }

        let fetched = match timeout(
            self.config.request_timeout(),
            self.service.available_gateways(amount),
        )
        .await
        {
            Ok(Ok(gateways)) => Ok(gateways),
            Ok(Err(err)) => Err(err),
            Err(_) => {
                warn!(
                    timeout_secs = self.config.request_timeout_secs,
                    "gateway catalog fetch timed out"
                );
                Err(ClientError::GatewayUnavailable)
            }
        };

        match fetched {
            Ok(gateways) => {
                debug!(gateway_count = gateways.len(), "gateway catalog refreshed");
                let catalog = GatewayCatalog::new(gateways);
                *self.snapshot.write().await = Some(Snapshot {
                    catalog: catalog.clone(),
                    fetched_at: Instant::now(),
                });
                Ok(catalog)
            }
            Err(err) => {
                if let Some(snap) = self.snapshot.read().await.as_ref() {
                    warn!(error = %err, "gateway refresh failed, serving stale catalog");
                    return Ok(snap.catalog.clone());
                }
                Err(err)
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
