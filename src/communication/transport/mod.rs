//! Parameter Transport Abstraction
//!
//! The manager never sees a wire format. It talks to the device through the
//! [`ParamTransport`] trait and receives replies through [`ParamSink`].
//!
//! ```text
//! ┌──────────────────────────┐   request_all / request_one / set_one
//! │       ParamManager       │ ─────────────────────────────────────┐
//! │  (implements ParamSink)  │                                      ▼
//! └──────────────────────────┘                        ┌──────────────────────┐
//!              ▲                                      │    ParamTransport    │
//!              │  update_param (any thread)           │ (MockDevice, MAVLink)│
//!              └───────────────────────────────────── └──────────────────────┘
//! ```
//!
//! # Contract
//!
//! - Sends are fire-and-forget: an `Ok` only means the request left.
//! - Replies are delivered from the transport's own thread of control, at
//!   any time, in any order, possibly after the caller gave up.
//! - The transport holds the sink weakly so the manager can own the
//!   transport without forming a reference cycle.
//!
//! # Modules
//!
//! - `mock` - Scripted in-memory device for tests and demos

pub mod mock;

use std::sync::Weak;

use param_sync_core::parameters::ParamValue;

use crate::error::TransportError;

/// Receiver of device-originated parameter values
pub trait ParamSink: Send + Sync {
    /// Deliver one parameter value reported by the device.
    ///
    /// `count` is the device's total parameter count.
    fn update_param(&self, id: &str, index: u16, count: u16, value: ParamValue);
}

/// Request channel to the device
pub trait ParamTransport: Send + Sync {
    /// One-time wiring: replies are delivered to `sink` from now on.
    fn register_model(&self, sink: Weak<dyn ParamSink>);

    /// Ask the device to send every parameter.
    fn request_all(&self) -> Result<(), TransportError>;

    /// Ask the device to resend the parameter at `index`.
    fn request_one(&self, index: u16) -> Result<(), TransportError>;

    /// Ask the device to accept `value` for parameter `id`.
    fn set_one(&self, id: &str, value: &ParamValue) -> Result<(), TransportError>;
}
