//! Logging abstraction
//!
//! Provides the crate's logging macros on top of the [`log`] facade. The
//! embedding application picks the backend (env_logger, a GUI log pane, ...);
//! without one installed every record is discarded.
//!
//! Use the macros as usual: `log_info!("Retrieved {} parameters", n)`.

#[doc(hidden)]
pub use log;

/// Log target shared by every record emitted from this crate
pub const LOG_TARGET: &str = "param_sync";

/// Log debug message
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::core::logging::log::debug!(target: $crate::core::logging::LOG_TARGET, $($arg)*)
    };
}

/// Log informational message
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::core::logging::log::info!(target: $crate::core::logging::LOG_TARGET, $($arg)*)
    };
}

/// Log warning message
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::core::logging::log::warn!(target: $crate::core::logging::LOG_TARGET, $($arg)*)
    };
}

/// Log error message
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::core::logging::log::error!(target: $crate::core::logging::LOG_TARGET, $($arg)*)
    };
}
