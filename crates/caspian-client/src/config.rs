//! # Client Configuration
//!
//! Timing knobs for the async boundary.
//!
//! ## What Each Knob Controls
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Client Timing Parameters                            │
//! │                                                                         │
//! │  debounce_ms (default 300)                                             │
//! │  ──────────────────────────                                            │
//! │  Quiet period after a coupon-field keystroke before the registry is    │
//! │  called. A newer keystroke for the same code restarts the clock.       │
//! │                                                                         │
//! │  request_timeout_secs (default 8)                                      │
//! │  ────────────────────────────────                                      │
//! │  Deadline for any single collaborator call. Expiry maps to            │
//! │  ValidationTimeout / GatewayUnavailable - nothing is left pending.     │
//! │                                                                         │
//! │  catalog_ttl_secs (default 60)                                         │
//! │  ──────────────────────────────                                        │
//! │  How long a fetched gateway catalog counts as fresh. Within the TTL    │
//! │  quotes reuse the snapshot; past it the next quote refreshes           │
//! │  (serving the stale snapshot if the refresh fails).                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ClientError, ClientResult};

/// Shortest debounce the checkout UI contract allows.
///
/// Anything faster hammers the registry on every keystroke.
pub const MIN_DEBOUNCE_MS: u64 = 300;

// =============================================================================
// Client Configuration
// =============================================================================

/// Timing configuration for validation, catalog caching, and collaborator
/// calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Quiet period before a coupon validation fires (milliseconds).
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Deadline for a single collaborator call (seconds).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Freshness window for a fetched gateway catalog (seconds).
    #[serde(default = "default_catalog_ttl")]
    pub catalog_ttl_secs: u64,
}

fn default_debounce_ms() -> u64 {
    MIN_DEBOUNCE_MS
}

fn default_request_timeout() -> u64 {
    8
}

fn default_catalog_ttl() -> u64 {
    60
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            debounce_ms: default_debounce_ms(),
            request_timeout_secs: default_request_timeout(),
            catalog_ttl_secs: default_catalog_ttl(),
        }
    }
}

impl ClientConfig {
    /// Creates a config with the default timings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ClientResult<()> {
        if self.debounce_ms < MIN_DEBOUNCE_MS {
            return Err(ClientError::InvalidConfig(format!(
                "debounce_ms must be at least {}, got {}",
                MIN_DEBOUNCE_MS, self.debounce_ms
            )));
        }

        if self.request_timeout_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.catalog_ttl_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "catalog_ttl_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Returns the debounce quiet period as a `Duration`.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Returns the collaborator call deadline as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Returns the catalog freshness window as a `Duration`.
    pub fn catalog_ttl(&self) -> Duration {
        Duration::from_secs(self.catalog_ttl_secs)
    }
}
