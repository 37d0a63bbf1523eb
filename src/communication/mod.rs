//! Communication with the device
//!
//! # Modules
//!
//! - `transport` - Transport and sink traits, plus the scripted mock device
//! - `mavlink` - MAVLink 2.0 parameter transport over UDP

pub mod mavlink;
pub mod transport;
