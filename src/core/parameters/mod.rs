//! Parameter management system
//!
//! This module provides the parameter cache coordinator. Value types live in
//! the `param_sync_core` crate and are re-exported here.

pub mod manager;

pub use manager::ParamManager;
pub use param_sync_core::parameters::{CoercionError, ParamKind, ParamValue, Parameter};
