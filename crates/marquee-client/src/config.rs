//! Client configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for the queue-server client.
///
/// Timings are tunable so tests can run the state machine on a compressed
/// clock; the defaults match device behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Queue server host name or address.
    pub host: String,
    /// Queue server port.
    pub port: u16,
    /// Burn-in account name, used until the device owns an identity.
    pub username: String,
    /// Burn-in password.
    pub password: String,
    /// Message slots kept for rendering.
    pub ring_capacity: usize,
    /// Milliseconds between connected-state polls.
    pub poll_interval_ms: u64,
    /// Minimum milliseconds between successive command writes.
    pub write_spacing_ms: u64,
    /// Milliseconds to wait before retrying a failed connect.
    pub reconnect_cooldown_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            host: "127.0.0.1".to_string(),
            port: 6379,
            username: String::new(),
            password: String::new(),
            ring_capacity: 3,
            poll_interval_ms: 100,
            write_spacing_ms: 500,
            reconnect_cooldown_ms: 1000,
        }
    }
}

impl ClientConfig {
    /// Set the server endpoint.
    pub fn with_server(mut self, host: &str, port: u16) -> Self {
        self.host = host.to_string();
        self.port = port;
        self
    }

    /// Set the burn-in credentials.
    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.username = username.to_string();
        self.password = password.to_string();
        self
    }

    /// Set the number of message slots kept for rendering.
    pub fn with_ring_capacity(mut self, capacity: usize) -> Self {
        self.ring_capacity = capacity;
        self
    }

    /// Check that the configuration can bootstrap a device.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::MissingHost);
        }
        if self.username.is_empty() || self.password.is_empty() {
            return Err(ConfigError::MissingCredentials);
        }
        Ok(())
    }
}
