//! Client error types.

use thiserror::Error;

/// Rejections raised by [`ClientConfig::validate`](crate::ClientConfig::validate).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No server host was configured.
    #[error("server host is empty")]
    MissingHost,

    /// Burn-in credentials are required to bootstrap an identity.
    #[error("burn-in username or password is empty")]
    MissingCredentials,
}
