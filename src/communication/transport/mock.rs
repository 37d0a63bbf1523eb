//! Mock device transport for testing
//!
//! Simulates a device holding a parameter table. Replies are delivered from
//! a spawned thread, like a real receiver loop would. Supports:
//! - Dropping replies per index on broadcast, individual and set requests
//! - A fully silent device
//! - Reply latency
//! - Call recording for asserting on issued traffic
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use param_sync::communication::transport::mock::MockDevice;
//! use param_sync::{ManagerConfig, ParamManager};
//!
//! let device = Arc::new(MockDevice::new(vec![
//!     ("RPM_LIMIT", 6000.into()),
//!     ("TEMP_MAX", 95.0.into()),
//! ]));
//! let manager = ParamManager::new(device.clone(), ManagerConfig::default());
//!
//! assert!(manager.retrieve_all());
//! assert_eq!(manager.len(), 2);
//! assert_eq!(device.request_all_count(), 1);
//! ```

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread;
use std::time::Duration;

use param_sync_core::parameters::ParamValue;

use super::{ParamSink, ParamTransport};
use crate::error::TransportError;

/// Request kinds recorded by [`MockDevice`]
#[derive(Debug, Clone, PartialEq)]
pub enum MockRequest {
    All,
    One(u16),
    Set(String, ParamValue),
}

#[derive(Debug, Default)]
struct DeviceState {
    params: Vec<(String, ParamValue)>,
    drop_broadcast: HashSet<u16>,
    drop_individual: HashSet<u16>,
    drop_set: HashSet<u16>,
    silent: bool,
    reply_delay: Duration,
    requests: Vec<MockRequest>,
}

/// Mock device implementing [`ParamTransport`]
pub struct MockDevice {
    state: Arc<Mutex<DeviceState>>,
    sink: Mutex<Option<Weak<dyn ParamSink>>>,
}

impl MockDevice {
    /// Create a device holding `params`; the position in the list is the index.
    pub fn new<S: Into<String>>(params: Vec<(S, ParamValue)>) -> Self {
        let params = params.into_iter().map(|(id, v)| (id.into(), v)).collect();
        Self {
            state: Arc::new(Mutex::new(DeviceState {
                params,
                ..DeviceState::default()
            })),
            sink: Mutex::new(None),
        }
    }

    /// Never answer `index` when it is part of a broadcast.
    pub fn drop_broadcast_reply(&self, index: u16) {
        self.state().drop_broadcast.insert(index);
    }

    /// Never answer an individual request for `index`.
    pub fn drop_request_reply(&self, index: u16) {
        self.state().drop_individual.insert(index);
    }

    /// Accept writes to `index` but never confirm them.
    pub fn drop_set_reply(&self, index: u16) {
        self.state().drop_set.insert(index);
    }

    /// Remove every drop rule.
    pub fn clear_drops(&self) {
        let mut state = self.state();
        state.drop_broadcast.clear();
        state.drop_individual.clear();
        state.drop_set.clear();
    }

    /// A silent device records requests but never replies.
    pub fn set_silent(&self, silent: bool) {
        self.state().silent = silent;
    }

    pub fn set_reply_delay(&self, delay: Duration) {
        self.state().reply_delay = delay;
    }

    /// Change a value on the device side without telling anyone.
    pub fn set_device_value(&self, index: u16, value: ParamValue) {
        if let Some(entry) = self.state().params.get_mut(index as usize) {
            entry.1 = value;
        }
    }

    pub fn device_value(&self, id: &str) -> Option<ParamValue> {
        self.state()
            .params
            .iter()
            .find(|(name, _)| name == id)
            .map(|(_, v)| v.clone())
    }

    /// Deliver the current value of `index` immediately on the caller's thread.
    ///
    /// Models a reply that was in flight when the manager stopped waiting.
    pub fn announce(&self, index: u16) {
        let reply = {
            let state = self.state();
            let count = state.params.len() as u16;
            state
                .params
                .get(index as usize)
                .map(|(id, v)| (id.clone(), index, count, v.clone()))
        };
        if let (Some(reply), Some(sink)) = (reply, self.sink()) {
            sink.update_param(&reply.0, reply.1, reply.2, reply.3);
        }
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<MockRequest> {
        self.state().requests.clone()
    }

    pub fn request_all_count(&self) -> usize {
        self.state()
            .requests
            .iter()
            .filter(|r| matches!(r, MockRequest::All))
            .count()
    }

    pub fn request_one_calls(&self) -> Vec<u16> {
        self.state()
            .requests
            .iter()
            .filter_map(|r| match r {
                MockRequest::One(index) => Some(*index),
                _ => None,
            })
            .collect()
    }

    pub fn set_one_calls(&self) -> Vec<(String, ParamValue)> {
        self.state()
            .requests
            .iter()
            .filter_map(|r| match r {
                MockRequest::Set(id, value) => Some((id.clone(), value.clone())),
                _ => None,
            })
            .collect()
    }

    fn state(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sink(&self) -> Option<Arc<dyn ParamSink>> {
        self.sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(Weak::upgrade)
    }

    /// Deliver `replies` from a background thread after the configured delay.
    fn reply(&self, delay: Duration, replies: Vec<(String, u16, u16, ParamValue)>) {
        if replies.is_empty() {
            return;
        }
        let Some(sink) = self.sink() else {
            return;
        };

        thread::spawn(move || {
            if !delay.is_zero() {
                thread::sleep(delay);
            }
            for (id, index, count, value) in replies {
                sink.update_param(&id, index, count, value);
            }
        });
    }
}

impl ParamTransport for MockDevice {
    fn register_model(&self, sink: Weak<dyn ParamSink>) {
        *self.sink.lock().unwrap_or_else(PoisonError::into_inner) = Some(sink);
    }

    fn request_all(&self) -> Result<(), TransportError> {
        let (delay, replies) = {
            let mut state = self.state();
            state.requests.push(MockRequest::All);
            if state.silent {
                return Ok(());
            }

            let count = state.params.len() as u16;
            let replies = state
                .params
                .iter()
                .enumerate()
                .map(|(i, (id, v))| (id.clone(), i as u16, count, v.clone()))
                .filter(|(_, index, _, _)| !state.drop_broadcast.contains(index))
                .collect();
            (state.reply_delay, replies)
        };

        self.reply(delay, replies);
        Ok(())
    }

    fn request_one(&self, index: u16) -> Result<(), TransportError> {
        let (delay, replies) = {
            let mut state = self.state();
            state.requests.push(MockRequest::One(index));
            if state.silent || state.drop_individual.contains(&index) {
                return Ok(());
            }

            let count = state.params.len() as u16;
            let replies = state
                .params
                .get(index as usize)
                .map(|(id, v)| vec![(id.clone(), index, count, v.clone())])
                .unwrap_or_default();
            (state.reply_delay, replies)
        };

        self.reply(delay, replies);
        Ok(())
    }

    fn set_one(&self, id: &str, value: &ParamValue) -> Result<(), TransportError> {
        let (delay, replies) = {
            let mut state = self.state();
            state
                .requests
                .push(MockRequest::Set(id.to_string(), value.clone()));
            if state.silent {
                return Ok(());
            }

            let count = state.params.len() as u16;
            let Some(index) = state.params.iter().position(|(name, _)| name == id) else {
                // Unknown ids are ignored, as a real device would
                return Ok(());
            };
            state.params[index].1 = value.clone();

            let index = index as u16;
            if state.drop_set.contains(&index) {
                return Ok(());
            }
            (
                state.reply_delay,
                vec![(id.to_string(), index, count, value.clone())],
            )
        };

        self.reply(delay, replies);
        Ok(())
    }
}
