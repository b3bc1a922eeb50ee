//! Error types for the wire protocol.

use thiserror::Error;

/// Errors that can occur when encoding commands.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The encoded command exceeds the outbound wire budget.
    #[error("command overflow: max {max} bytes, got {actual}")]
    CommandOverflow { max: usize, actual: usize },

    /// A single argument cannot be represented on the wire.
    #[error("argument too long: max {max} bytes, got {actual}")]
    ArgumentTooLong { max: usize, actual: usize },
}

/// Result type alias for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
