//! Parsed reply values and well-known reply classification.

use crate::constants::{ERR_PREFIX_NOPERM, ERR_PREFIX_WRONGPASS, REPLY_OK};

/// A value produced by feeding one byte to the reply reader.
///
/// Payload-carrying variants refer to bytes the reader has already copied
/// into the caller's scratch buffer; the variant only reports how many.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolValue {
    /// No complete value yet; keep feeding bytes.
    Empty,

    /// A `+` or `-` line finished; `len` bytes of line body (sigil and
    /// terminator stripped) are in the scratch buffer.
    SimpleReply { is_error: bool, len: usize },

    /// An integer line (`:<value>\r\n`) finished.
    Integer { value: i64 },

    /// An array header finished. A negative count is the null array; the
    /// element values follow as their own completions otherwise.
    ArrayHeader { count: i32 },

    /// A bulk string finished with `length` bytes copied into the scratch
    /// buffer. A length of `-1` is the null bulk: no body bytes existed and
    /// the scratch buffer was not touched.
    BulkRead { length: i32 },

    /// The stream was malformed. The reader has returned to idle and will
    /// resynchronize on the next value sigil.
    Failure,
}

impl ProtocolValue {
    /// True for any completed value, including failures.
    pub fn is_complete(&self) -> bool {
        !matches!(self, ProtocolValue::Empty)
    }

    /// True when this value reports a malformed stream.
    pub fn is_failure(&self) -> bool {
        matches!(self, ProtocolValue::Failure)
    }
}

/// True when a completed simple line is the server's success marker.
pub fn is_ok_reply(line: &[u8]) -> bool {
    line == REPLY_OK
}

/// True when a completed error line reports rejected credentials.
pub fn is_credential_error(line: &[u8]) -> bool {
    line.starts_with(ERR_PREFIX_WRONGPASS)
}

/// True when a completed error line reports missing permissions.
pub fn is_permission_error(line: &[u8]) -> bool {
    line.starts_with(ERR_PREFIX_NOPERM)
}
