//! Core parameter synchronization functionality
//!
//! This module contains the parameter manager, change notification and the
//! logging facade.

pub mod logging;
pub mod notifier;
pub mod parameters;
