//! Parameter manager
//!
//! Keeps the local parameter cache consistent with the device over a
//! fire-and-forget transport.
//!
//! # Protocol
//!
//! - **Retrieval**: broadcast request, wait up to T, re-request each missing
//!   index individually, wait up to T again.
//! - **Sync**: one `set_one` per dirty parameter, wait up to T once. Writes
//!   are never resent automatically; the residual set is left in
//!   [`ParamManager::missing`] for the caller to decide.
//!
//! Replies arrive through [`ParamManager::update_param`] on the transport's
//! thread. The cache, the outstanding set and the completion flag share one
//! lock, so removing the last outstanding index and the caller's
//! empty-check can never interleave.
//!
//! Only one retrieval or sync may be in flight at a time.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};

use param_sync_core::parameters::{Parameter, ParamValue};

use crate::communication::transport::{ParamSink, ParamTransport};
use crate::config::ManagerConfig;
use crate::core::notifier::ChangeNotifier;
use crate::error::ParamError;
use crate::{log_debug, log_error, log_info, log_warn};

/// Operation currently waiting for replies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Round {
    #[default]
    Idle,
    /// `sized` becomes true once the first reply told us the total count
    Retrieve { sized: bool },
    Sync,
}

#[derive(Debug, Default)]
struct SyncState {
    parameters: HashMap<String, Parameter>,
    /// Indices whose reply is still awaited
    outstanding: BTreeSet<u16>,
    round: Round,
    /// Level-triggered completion signal, guarded by the same lock
    done: bool,
}

impl SyncState {
    fn retrieval_complete(&self) -> bool {
        self.round == Round::Retrieve { sized: true } && self.outstanding.is_empty()
    }
}

/// Coordinator owning the parameter cache
pub struct ParamManager {
    transport: Arc<dyn ParamTransport>,
    config: ManagerConfig,
    state: Mutex<SyncState>,
    signal: Condvar,
    notifier: ChangeNotifier,
}

impl ParamManager {
    /// Create a manager and register it with `transport` as reply sink.
    pub fn new(transport: Arc<dyn ParamTransport>, config: ManagerConfig) -> Arc<Self> {
        let manager = Arc::new(Self {
            transport,
            config,
            state: Mutex::new(SyncState::default()),
            signal: Condvar::new(),
            notifier: ChangeNotifier::new(),
        });

        let weak: Weak<Self> = Arc::downgrade(&manager);
        let sink: Weak<dyn ParamSink> = weak;
        manager.transport.register_model(sink);
        manager
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Change notifications, emitted after `clear`, `retrieve_all` and `sync`.
    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    /// Apply one device-reported value.
    ///
    /// Safe to call from any thread at any time, including after the
    /// operation that requested it has timed out. The device value is
    /// authoritative: it replaces the cached value and clears dirty.
    pub fn update_param(&self, id: &str, index: u16, count: u16, value: ParamValue) {
        let mut state = self.lock();

        if state.round == (Round::Retrieve { sized: false }) {
            state.outstanding = (0..count).collect();
            state.round = Round::Retrieve { sized: true };
        }

        match state.parameters.get_mut(id) {
            Some(param) => match param.confirm(&value) {
                Ok(()) => log_debug!("Update: {}: {}", id, param.value()),
                Err(err) => {
                    log_warn!("Update: {}: {}, replacing cached entry", id, err);
                    *param = Parameter::new(id, index, value);
                }
            },
            None => {
                log_debug!("Add: {}: {}", id, value);
                state
                    .parameters
                    .insert(id.to_string(), Parameter::new(id, index, value));
            }
        }

        let awaited = state.outstanding.remove(&index);
        if awaited && state.outstanding.is_empty() && state.round != Round::Idle {
            log_debug!("Round complete");
            state.done = true;
            self.signal.notify_all();
        }
    }

    /// Rebuild the whole cache from the device.
    ///
    /// Returns true iff every parameter was received. Never blocks longer
    /// than two timeout periods.
    pub fn retrieve_all(&self) -> bool {
        {
            let mut state = self.lock();
            state.outstanding.clear();
            state.round = Round::Retrieve { sized: false };
            state.done = false;
        }

        if let Err(err) = self.transport.request_all() {
            log_error!("Parameter request failed: {}", err);
        }
        let mut state = self.wait_round();

        if !state.retrieval_complete() && self.config.retry_missing {
            state.done = false;
            if state.round == (Round::Retrieve { sized: true }) {
                let missing: Vec<u16> = state.outstanding.iter().copied().collect();
                drop(state);

                log_warn!("Missing {} parameters, trying to request.", missing.len());
                for index in missing {
                    if let Err(err) = self.transport.request_one(index) {
                        log_error!("Request for #{} failed: {}", index, err);
                    }
                }
            } else {
                // Nothing answered, so the parameter count is still unknown
                drop(state);

                log_warn!("No reply to parameter request, requesting again.");
                if let Err(err) = self.transport.request_all() {
                    log_error!("Parameter request failed: {}", err);
                }
            }
            state = self.wait_round();
        }

        let complete = state.retrieval_complete();
        if complete {
            log_info!("Retrieved {} parameters", state.parameters.len());
        } else if state.round == (Round::Retrieve { sized: false }) {
            log_error!("No parameters received");
        } else {
            log_error!("Missing {} parameters", state.outstanding.len());
        }

        state.round = Round::Idle;
        drop(state);

        self.notifier.notify();
        complete
    }

    /// Push every dirty parameter to the device.
    ///
    /// Returns true iff every write was confirmed within one timeout period.
    /// Unconfirmed indices are left in [`ParamManager::missing`].
    pub fn sync(&self) -> bool {
        let to_sync = {
            let mut state = self.lock();
            let mut dirty: Vec<(u16, String, ParamValue)> = state
                .parameters
                .values()
                .filter(|p| p.is_dirty())
                .map(|p| (p.index(), p.id().to_string(), p.value().clone()))
                .collect();
            dirty.sort_by_key(|(index, _, _)| *index);

            state.outstanding = dirty.iter().map(|(index, _, _)| *index).collect();
            state.round = if dirty.is_empty() { Round::Idle } else { Round::Sync };
            state.done = false;
            dirty
        };

        if to_sync.is_empty() {
            log_info!("Nothing to sync");
            self.notifier.notify();
            return true;
        }

        for (index, id, value) in &to_sync {
            log_debug!("Set: {} #{}: {}", id, index, value);
            if let Err(err) = self.transport.set_one(id, value) {
                log_error!("Set {} failed: {}", id, err);
            }
        }

        let mut state = self.wait_round();
        let complete = state.outstanding.is_empty();
        if complete {
            log_info!("Synced {} parameters", to_sync.len());
        } else {
            log_error!("Not synced {} parameters", state.outstanding.len());
        }

        state.round = Round::Idle;
        drop(state);

        self.notifier.notify();
        complete
    }

    /// Drop every cached parameter.
    pub fn clear(&self) {
        self.lock().parameters.clear();
        self.notifier.notify();
    }

    /// Edit a parameter locally.
    ///
    /// Returns the new dirty state. A value that cannot be coerced to the
    /// parameter's kind is logged and reported as [`ParamError::Rejected`];
    /// the cached value is left unchanged.
    pub fn set_value(&self, id: &str, value: impl Into<ParamValue>) -> Result<bool, ParamError> {
        let mut state = self.lock();
        let param = state
            .parameters
            .get_mut(id)
            .ok_or_else(|| ParamError::NotFound(id.to_string()))?;

        param.set_value(value).map_err(|source| {
            log_error!("Set: {}: {}", id, source);
            ParamError::Rejected {
                id: id.to_string(),
                source,
            }
        })
    }

    pub fn get(&self, id: &str) -> Option<Parameter> {
        self.lock().parameters.get(id).cloned()
    }

    /// Snapshot of every cached parameter, ordered by index.
    pub fn parameters(&self) -> Vec<Parameter> {
        self.snapshot(|_| true)
    }

    /// Snapshot of the parameters with local edits, ordered by index.
    pub fn changed(&self) -> Vec<Parameter> {
        self.snapshot(Parameter::is_dirty)
    }

    /// Indices the last retrieval or sync did not get a reply for.
    ///
    /// Late replies still shrink this set after the operation returned.
    pub fn missing(&self) -> BTreeSet<u16> {
        self.lock().outstanding.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().parameters.is_empty()
    }

    fn snapshot(&self, filter: impl Fn(&Parameter) -> bool) -> Vec<Parameter> {
        let mut params: Vec<Parameter> = self
            .lock()
            .parameters
            .values()
            .filter(|p| filter(p))
            .cloned()
            .collect();
        params.sort_by_key(Parameter::index);
        params
    }

    /// Block until the current round completes or the timeout elapses.
    fn wait_round(&self) -> MutexGuard<'_, SyncState> {
        let guard = self.lock();
        let (guard, result) = self
            .signal
            .wait_timeout_while(guard, self.config.timeout(), |state| !state.done)
            .unwrap_or_else(PoisonError::into_inner);
        if result.timed_out() {
            log_debug!("Round timed out with {} outstanding", guard.outstanding.len());
        }
        guard
    }

    fn lock(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ParamSink for ParamManager {
    fn update_param(&self, id: &str, index: u16, count: u16, value: ParamValue) {
        ParamManager::update_param(self, id, index, count, value);
    }
}

impl std::fmt::Debug for ParamManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("ParamManager")
            .field("parameters", &state.parameters.len())
            .field("outstanding", &state.outstanding)
            .field("round", &state.round)
            .finish()
    }
}
