//! MAVLink 2.0 Parameter Transport
//!
//! Connects the parameter manager to a MAVLink vehicle or controller using
//! the parameter microservice (PARAM_REQUEST_LIST, PARAM_REQUEST_READ,
//! PARAM_SET, PARAM_VALUE).
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use param_sync::communication::mavlink::MavlinkParamLink;
//! use param_sync::{LinkConfig, ManagerConfig, ParamManager};
//!
//! let link = Arc::new(MavlinkParamLink::bind(LinkConfig::default()).unwrap());
//! let manager = ParamManager::new(link, ManagerConfig::default());
//! manager.retrieve_all();
//! ```

pub mod codec;
pub mod link;

pub use link::MavlinkParamLink;
