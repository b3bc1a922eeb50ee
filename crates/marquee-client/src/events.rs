//! Events crossing the client's boundary in both directions.

// ============================================================================
// Network-Status Bridge
// ============================================================================

/// Connectivity changes reported by the platform's network stack, handed to
/// [`Client::advance`](crate::Client::advance) at most one per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkEvent {
    /// The link layer started associating.
    Connecting,
    /// The link came up; traffic can flow.
    Connected,
    /// The link layer gave up associating.
    FailedConnection,
    /// The link dropped.
    Disconnected,
    /// The platform is suspending the link (deep sleep, power save). The
    /// session is held rather than torn down.
    ConnectionInterruption,
    /// The platform returned from a suspension. Any held session is stale
    /// and must be rebuilt.
    ConnectionResumed,
}

// ============================================================================
// Client Events
// ============================================================================

/// Progress the client surfaces to the application, at most one per tick.
///
/// These are the only externally visible signals; every failure mode is
/// absorbed into the reconnect policy internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientEvent {
    /// A connect attempt failed; the client will retry after a cooldown.
    ConnectionFailed,
    /// An established session was torn down by a link change.
    ConnectionLost,
    /// The server accepted the burn-in credentials.
    ConnectionEstablished,
    /// The device holds an identity, fresh from the registrar or loaded
    /// from the identity store.
    IdentityReceived,
    /// The server accepted the device's identity; the work loop is running.
    Authorized,
    /// A message was copied into the ring and is ready to render.
    MessageReceived,
}
