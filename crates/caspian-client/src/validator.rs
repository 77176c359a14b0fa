//! # Coupon Validator
//!
//! Debounced, single-flight coupon validation against the registry
//! collaborator.
//!
//! ## Request Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Validation Request Lifecycle                          │
//! │                                                                         │
//! │  keystroke ──► trigger(gen N, ledger v)                                 │
//! │                   │                                                     │
//! │                   ▼  quiet period (≥300ms)                              │
//! │            still the latest trigger for this code?                      │
//! │                   │ no ──► Superseded (a newer keystroke owns it)       │
//! │                   ▼ yes                                                 │
//! │            already a request on the wire for this code?                 │
//! │                   │ yes ──► Superseded (single-flight: don't duplicate) │
//! │                   ▼ no                                                  │
//! │            registry call, deadline 8s ──timeout──► ValidationTimeout    │
//! │                   │                                                     │
//! │                   ▼                                                     │
//! │            ValidationOutcome { generation N, ledger v, check }          │
//! │                                                                         │
//! │  The session applies an outcome ONLY if its generation is still the     │
//! │  newest trigger AND the ledger version still matches - anything else    │
//! │  is dropped, never applied late.                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use caspian_core::coupon::normalize_code;
use caspian_core::order::OrderSnapshot;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::services::{CouponCheck, CouponRegistry};

// =============================================================================
// Validation Outcome
// =============================================================================

/// The result of one completed validation, stamped with everything the
/// session needs to decide whether it still applies.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    /// Normalized code the outcome belongs to.
    pub code: String,

    /// Trigger generation. Compared against the validator's newest
    /// generation: an older outcome lost the race to a newer request.
    pub generation: u64,

    /// Ledger version observed at trigger time. Compared against the
    /// ledger's current version: a mismatch means the user moved on while
    /// this request was in flight.
    pub ledger_version: u64,

    /// The registry's answer.
    pub check: CouponCheck,
}

// =============================================================================
// Coupon Validator
// =============================================================================

/// Debounced, single-flight front door to the coupon registry.
///
/// ## Guarantees
/// - At most one registry call in flight per normalized code
/// - A retrigger during the quiet period silently wins over the sleeper
/// - Every call has a hard deadline; nothing is left pending
/// - Outcomes are stamped, so stale ones can be recognized and dropped
pub struct CouponValidator {
    registry: Arc<dyn CouponRegistry>,
    config: ClientConfig,

    /// Global trigger counter. The newest generation is the only one whose
    /// outcome should reach the ledger.
    generation: AtomicU64,

    state: Mutex<ValidatorState>,
}

#[derive(Default)]
struct ValidatorState {
    /// Newest trigger generation per normalized code.
    latest_trigger: HashMap<String, u64>,

    /// Codes with a registry call currently on the wire.
    in_flight: HashSet<String>,
}

impl CouponValidator {
    /// Creates a validator over a registry collaborator.
    pub fn new(registry: Arc<dyn CouponRegistry>, config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        Ok(CouponValidator {
            registry,
            config,
            generation: AtomicU64::new(0),
            state: Mutex::new(ValidatorState::default()),
        })
    }

    /// The newest trigger generation handed out so far.
    pub fn latest_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Returns true if no newer validation has been triggered since this
    /// outcome's request.
    pub fn is_current(&self, outcome: &ValidationOutcome) -> bool {
        outcome.generation == self.latest_generation()
    }

    /// Validates a code against the registry.
    ///
    /// `ledger_version` is the ledger's version as observed by the caller
    /// at trigger time; it rides through unchanged so the session can
    /// detect a ledger that moved on mid-flight.
    ///
    /// ## Errors
    /// - `Superseded` - a newer trigger for the same code arrived during
    ///   the quiet period, or a request for this code is already in flight
    /// - `ValidationTimeout` - the registry missed the deadline
    /// - `Service` - the registry call itself failed
    pub async fn validate(
        &self,
        code: &str,
        order: &OrderSnapshot,
        ledger_version: u64,
    ) -> ClientResult<ValidationOutcome> {
        let key = normalize_code(code);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        {
            let mut state = self.state.lock().await;
            state.latest_trigger.insert(key.clone(), generation);
        }

        // Quiet period. A newer trigger for the same code restarts the
        // clock by replacing us as the latest.
        sleep(self.config.debounce()).await;

        {
            let mut state = self.state.lock().await;
            if state.latest_trigger.get(&key) != Some(&generation) {
                debug!(code = %key, generation, "validation superseded during quiet period");
                return Err(ClientError::Superseded);
            }
            if !state.in_flight.insert(key.clone()) {
                debug!(code = %key, generation, "validation already in flight, ignoring trigger");
                return Err(ClientError::Superseded);
            }
        }

        debug!(code = %key, generation, ledger_version, "validating coupon against registry");

        let result = timeout(
            self.config.request_timeout(),
            self.registry
                .validate_coupon(&key, order.subtotal(), order.items()),
        )
        .await;

        {
            let mut state = self.state.lock().await;
            state.in_flight.remove(&key);
        }

        let check = match result {
            Ok(Ok(check)) => check,
            Ok(Err(err)) => {
                warn!(code = %key, error = %err, "coupon validation call failed");
                return Err(err);
            }
            Err(_) => {
                warn!(
                    code = %key,
                    timeout_secs = self.config.request_timeout_secs,
                    "coupon validation timed out"
                );
                return Err(ClientError::ValidationTimeout);
            }
        };

        Ok(ValidationOutcome {
            code: key,
            generation,
            ledger_version,
            check,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
