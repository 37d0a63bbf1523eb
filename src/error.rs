use param_sync_core::parameters::CoercionError;

/// Errors returned by local edits made through the parameter manager.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ParamError {
    #[error("Parameter not found: {0}")]
    NotFound(String),

    #[error("Rejected value for {id}: {source}")]
    Rejected {
        id: String,
        #[source]
        source: CoercionError,
    },
}

/// Errors that can occur while handing a request to a transport.
///
/// A send error never fails a manager operation; the affected index simply
/// stays outstanding.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Not connected")]
    NotConnected,

    #[error("Unsupported value for {id}: {reason}")]
    Unsupported { id: String, reason: &'static str },

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
