//! Configuration for the parameter manager and the MAVLink link.
//!
//! Both structs deserialize from JSON with every field optional, falling back
//! to [`Default`].

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default wait per round (10 s, as the operator console always used).
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Configuration for [`ParamManager`](crate::ParamManager).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// How long each round waits for outstanding replies, in milliseconds.
    pub timeout_ms: u64,
    /// Re-request indices still missing after the broadcast round.
    pub retry_missing: bool,
}

impl ManagerConfig {
    /// Build a configuration with the given per-round timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout_ms: timeout.as_millis() as u64,
            ..Self::default()
        }
    }

    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            retry_missing: true,
        }
    }
}

/// Configuration for [`MavlinkParamLink`](crate::communication::mavlink::MavlinkParamLink).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Local UDP address to bind.
    pub bind_addr: SocketAddr,
    /// Device address. `None` waits for the first datagram from the device.
    pub target_addr: Option<SocketAddr>,
    /// Our MAVLink system id (255 is the conventional GCS id).
    pub system_id: u8,
    /// Our MAVLink component id.
    pub component_id: u8,
    /// Device system id.
    pub target_system: u8,
    /// Device component id.
    pub target_component: u8,
}

impl LinkConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 14550)),
            target_addr: None,
            system_id: 255,
            component_id: 190, // MAV_COMP_ID_MISSIONPLANNER
            target_system: 1,
            target_component: 1, // MAV_COMP_ID_AUTOPILOT1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manager_defaults() {
        let config = ManagerConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert!(config.retry_missing);
    }

    #[test]
    fn test_manager_partial_json() {
        let config = ManagerConfig::from_json(r#"{ "timeout_ms": 250 }"#).unwrap();
        assert_eq!(config.timeout(), Duration::from_millis(250));
        assert!(config.retry_missing);
    }

    #[test]
    fn test_manager_invalid_json() {
        assert!(ManagerConfig::from_json(r#"{ "timeout_ms": "soon" }"#).is_err());
    }

    #[test]
    fn test_link_json() {
        let config = LinkConfig::from_json(
            r#"{ "bind_addr": "127.0.0.1:0", "target_addr": "127.0.0.1:14555", "target_system": 3 }"#,
        )
        .unwrap();
        assert_eq!(config.bind_addr, SocketAddr::from(([127, 0, 0, 1], 0)));
        assert_eq!(config.target_addr, Some(SocketAddr::from(([127, 0, 0, 1], 14555))));
        assert_eq!(config.target_system, 3);
        assert_eq!(config.system_id, 255);
    }
}
