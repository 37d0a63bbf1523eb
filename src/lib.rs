//! param_sync - Local parameter cache kept consistent with a remote device
//!
//! This library mirrors a device's named parameters over an asynchronous,
//! lossy request/response channel. It reconstructs the full parameter set
//! from out-of-order, partially dropped replies, tracks local edits and
//! writes back only the edited subset.

// Parameter manager, change notification, logging
pub mod core;

// Transports (mock device, MAVLink over UDP)
pub mod communication;

pub mod config;
pub mod error;

pub use crate::communication::transport::{ParamSink, ParamTransport};
pub use crate::config::{LinkConfig, ManagerConfig};
pub use crate::core::notifier::{ChangeNotifier, ListenerId};
pub use crate::core::parameters::{
    CoercionError, ParamKind, ParamManager, ParamValue, Parameter,
};
pub use crate::error::{ConfigError, ParamError, TransportError};
