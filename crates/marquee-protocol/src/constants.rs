//! Protocol constants
//!
//! These constants define the wire sigils, size limits, queue names, and
//! well-known reply texts used when talking to the marquee queue server.

// ============================================================================
// Wire Sigils
// ============================================================================

/// First byte of an array header (`*<count>\r\n`).
pub const SIGIL_ARRAY: u8 = b'*';
/// First byte of a bulk string length (`$<len>\r\n`).
pub const SIGIL_BULK: u8 = b'$';
/// First byte of an integer line (`:<value>\r\n`).
pub const SIGIL_INTEGER: u8 = b':';
/// First byte of a simple (success) line (`+...\r\n`).
pub const SIGIL_SIMPLE: u8 = b'+';
/// First byte of an error line (`-...\r\n`).
pub const SIGIL_ERROR: u8 = b'-';

/// Line terminator for every wire element.
pub const CRLF: &[u8] = b"\r\n";

// ============================================================================
// Size Limits
// ============================================================================

/// Largest payload a device accepts in a single reply element. Also the
/// recommended capacity for the scratch buffer handed to the reader.
pub const MAX_PAYLOAD_LEN: usize = 1024;

/// Largest identity the registrar will assign.
pub const MAX_IDENTITY_LEN: usize = 36;

/// Largest encoded command the device will put on the wire.
pub const MAX_COMMAND_LEN: usize = 200;

// ============================================================================
// Command Words
// ============================================================================

/// Authenticate the session.
pub const CMD_AUTH: &str = "AUTH";
/// Pop the head of a list without blocking.
pub const CMD_LPOP: &str = "LPOP";
/// Pop the head of a list, blocking server-side up to a timeout.
pub const CMD_BLPOP: &str = "BLPOP";
/// Push onto the tail of a list.
pub const CMD_RPUSH: &str = "RPUSH";

// ============================================================================
// Queue Names
// ============================================================================

/// Server list holding freshly minted device identities.
pub const REGISTRATION_QUEUE: &str = "ob:r";
/// Server list devices push their identity onto as a heartbeat.
pub const HEARTBEAT_QUEUE: &str = "ob:i";
/// Prefix of the per-device message queue; the identity is appended.
pub const DEVICE_QUEUE_PREFIX: &str = "ob:";
/// Seconds the server holds a blocking pop open before replying null.
pub const POP_BLOCK_SECS: &str = "5";

// ============================================================================
// Well-Known Replies
// ============================================================================

/// Body of a successful simple line (`+OK\r\n` with sigil and CRLF stripped).
pub const REPLY_OK: &[u8] = b"OK";

/// Error prefix the server uses for rejected credentials.
pub const ERR_PREFIX_WRONGPASS: &[u8] = b"WRONGPASS";

/// Error prefix the server uses for missing command permissions.
pub const ERR_PREFIX_NOPERM: &[u8] = b"NOPERM";

/// Full bad-credential error line body, as documented server behavior.
pub const REPLY_WRONGPASS: &[u8] =
    b"WRONGPASS invalid username-password pair or user is disabled";

/// Full permission error line body, as documented server behavior.
pub const REPLY_NOPERM: &[u8] =
    b"NOPERM this user has no permissions to run the 'rpush' command or its subcommand";

// ============================================================================
// Control Payloads
// ============================================================================

/// Queue payload that commands the device to drop its identity and
/// re-register instead of displaying the message.
pub const RESET_PAYLOAD: &[u8] = b"__reset__";
