//! Parameter types
//!
//! This module provides the typed value model used by the parameter cache.
//! Synchronization with the device lives in the `param_sync` crate.

pub mod error;
pub mod parameter;
pub mod value;

pub use error::CoercionError;
pub use parameter::Parameter;
pub use value::{ParamKind, ParamValue};
