//! Retry workflow for failed calls
//!
//! Each retry runs `Idle -> Confirming -> InFlight -> {Succeeded, Failed}`
//! once. The only state that outlives a run is the per-call in-flight set,
//! which keeps a second retry of the same call from being sent while the
//! first is outstanding. Retries of different calls run independently.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use crate::api::CallApi;

/// Where a retry currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Idle,
    Confirming,
    InFlight,
    Succeeded,
    Failed,
}

/// How a single retry run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome {
    /// Operator said no; nothing was sent
    Declined,
    /// A retry for this call is already outstanding; nothing was sent
    AlreadyInFlight,
    Succeeded { message: String },
    /// Server refusal (message verbatim) or transport/parse failure (generic message)
    Failed { message: String },
}

impl RetryOutcome {
    pub fn state(&self) -> RetryState {
        match self {
            Self::Declined | Self::AlreadyInFlight => RetryState::Idle,
            Self::Succeeded { .. } => RetryState::Succeeded,
            Self::Failed { .. } => RetryState::Failed,
        }
    }

    /// Only a successful retry re-fetches the call list.
    pub fn refreshes_list(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Succeeded { message } | Self::Failed { message } => Some(message),
            Self::Declined | Self::AlreadyInFlight => None,
        }
    }
}

/// Blocking confirmation prompt shown before a retry is sent
#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, call_id: &str) -> bool;
}

/// Fixed answer, for `--yes` or a dialog the operator already accepted
pub struct Preconfirmed(pub bool);

#[async_trait]
impl Confirm for Preconfirmed {
    async fn confirm(&self, _call_id: &str) -> bool {
        self.0
    }
}

/// Runs retries against the API and owns the in-flight guard
pub struct RetryCoordinator<A: ?Sized> {
    api: Arc<A>,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl<A: ?Sized> Clone for RetryCoordinator<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<A: CallApi + ?Sized> RetryCoordinator<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn is_in_flight(&self, call_id: &str) -> bool {
        lock(&self.in_flight).contains(call_id)
    }

    pub fn state_of(&self, call_id: &str) -> RetryState {
        if self.is_in_flight(call_id) {
            RetryState::InFlight
        } else {
            RetryState::Idle
        }
    }

    /// Ask for confirmation, then send the retry.
    pub async fn retry(&self, call_id: &str, confirm: &dyn Confirm) -> RetryOutcome {
        if self.is_in_flight(call_id) {
            debug!(call_id, "retry already in flight, ignoring");
            return RetryOutcome::AlreadyInFlight;
        }

        debug!(call_id, state = ?RetryState::Confirming, "awaiting retry confirmation");
        if !confirm.confirm(call_id).await {
            debug!(call_id, "retry declined");
            return RetryOutcome::Declined;
        }

        self.execute(call_id).await
    }

    /// Send the retry for an already-confirmed call.
    pub async fn execute(&self, call_id: &str) -> RetryOutcome {
        let Some(_ticket) = self.acquire(call_id) else {
            debug!(call_id, "retry already in flight, ignoring");
            return RetryOutcome::AlreadyInFlight;
        };

        info!(call_id, state = ?RetryState::InFlight, "retrying failed call");
        match self.api.retry_call(call_id).await {
            Ok(result) if result.success => {
                info!(call_id, dispatch_id = ?result.dispatch_id, "retry accepted");
                RetryOutcome::Succeeded {
                    message: result.message,
                }
            }
            Ok(result) => {
                warn!(call_id, message = %result.message, "retry rejected by server");
                RetryOutcome::Failed {
                    message: result.message,
                }
            }
            Err(e) => {
                warn!(call_id, error = %e, "retry request failed");
                RetryOutcome::Failed {
                    message: e.user_message(),
                }
            }
        }
    }

    fn acquire(&self, call_id: &str) -> Option<InFlightTicket> {
        if !lock(&self.in_flight).insert(call_id.to_string()) {
            return None;
        }
        Some(InFlightTicket {
            set: Arc::clone(&self.in_flight),
            call_id: call_id.to_string(),
        })
    }
}

/// Marks a call as in flight until dropped
struct InFlightTicket {
    set: Arc<Mutex<HashSet<String>>>,
    call_id: String,
}

impl Drop for InFlightTicket {
    fn drop(&mut self) {
        lock(&self.set).remove(&self.call_id);
    }
}

fn lock(set: &Mutex<HashSet<String>>) -> MutexGuard<'_, HashSet<String>> {
    set.lock().unwrap_or_else(PoisonError::into_inner)
}
