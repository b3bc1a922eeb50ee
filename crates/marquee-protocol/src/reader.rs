//! Incremental reply reader.
//!
//! The device polls a non-blocking socket, so a reply can arrive split at any
//! byte boundary. [`ReplyReader`] consumes the stream one byte per call and
//! reports a [`ProtocolValue`] whenever a value completes. Payload bytes are
//! copied into a scratch slice the caller owns; the reader holds nothing but
//! its own small state and never allocates.
//!
//! ```text
//! +OK\r\n                  -> SimpleReply { is_error: false, len: 2 }
//! :12\r\n                  -> Integer { value: 12 }
//! *2\r\n                   -> ArrayHeader { count: 2 }
//! $5\r\nhello\r\n          -> BulkRead { length: 5 }
//! $-1\r\n                  -> BulkRead { length: -1 }   (null, no body)
//! ```
//!
//! A malformed byte yields [`ProtocolValue::Failure`] and drops the reader
//! back to idle; parsing resynchronizes on the next value sigil.

use log::warn;

use crate::constants::{SIGIL_ARRAY, SIGIL_BULK, SIGIL_ERROR, SIGIL_INTEGER, SIGIL_SIMPLE};
use crate::responses::ProtocolValue;

/// Which kind of length-prefixed line is being accumulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LengthKind {
    Array,
    Bulk,
    Integer,
}

/// Parser state carried between bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum State {
    /// Waiting for the sigil of the next value.
    #[default]
    Idle,
    /// Accumulating decimal digits for a header or integer line.
    ReadingLength {
        kind: LengthKind,
        digits: i64,
        sign: i64,
        pending_terminator: bool,
    },
    /// Copying a declared number of bulk payload bytes into scratch.
    ReadingBulkBody { remaining: usize, seen: usize },
    /// Copying a simple or error line into scratch until CRLF.
    ReadingSimpleLine {
        is_error: bool,
        len: usize,
        pending_terminator: bool,
    },
    /// Consuming the CRLF that trails a bulk body.
    Draining { length: i32, pending_terminator: bool },
}

/// Incremental reader for server replies.
///
/// One instance per connection; [`ReplyReader::reset`] abandons any partial
/// value when the connection does.
#[derive(Debug, Default)]
pub struct ReplyReader {
    state: State,
}

impl ReplyReader {
    /// Create a new reader in the idle state.
    pub fn new() -> Self {
        ReplyReader { state: State::Idle }
    }

    /// True when no value is partially parsed.
    pub fn is_idle(&self) -> bool {
        self.state == State::Idle
    }

    /// Drop any partial value and return to idle.
    pub fn reset(&mut self) {
        self.state = State::Idle;
    }

    /// Consume one byte from the stream.
    ///
    /// Payload bytes are written into `scratch` starting at index zero for
    /// each new value; the caller must not let a completed value's bytes go
    /// stale before consuming them, since the next value reuses the slice.
    pub fn feed(&mut self, byte: u8, scratch: &mut [u8]) -> ProtocolValue {
        let (next, value) = step(self.state, byte, scratch);
        self.state = next;
        value
    }
}

fn step(state: State, byte: u8, scratch: &mut [u8]) -> (State, ProtocolValue) {
    match state {
        State::Idle => begin_value(byte),
        State::ReadingLength {
            kind,
            digits,
            sign,
            pending_terminator,
        } => read_length(kind, digits, sign, pending_terminator, byte, scratch),
        State::ReadingBulkBody { remaining, seen } => read_body(remaining, seen, byte, scratch),
        State::ReadingSimpleLine {
            is_error,
            len,
            pending_terminator,
        } => read_line(is_error, len, pending_terminator, byte, scratch),
        State::Draining {
            length,
            pending_terminator,
        } => drain(length, pending_terminator, byte),
    }
}

fn begin_value(byte: u8) -> (State, ProtocolValue) {
    let length_of = |kind| State::ReadingLength {
        kind,
        digits: 0,
        sign: 1,
        pending_terminator: false,
    };

    match byte {
        SIGIL_ARRAY => (length_of(LengthKind::Array), ProtocolValue::Empty),
        SIGIL_BULK => (length_of(LengthKind::Bulk), ProtocolValue::Empty),
        SIGIL_INTEGER => (length_of(LengthKind::Integer), ProtocolValue::Empty),
        SIGIL_SIMPLE => (
            State::ReadingSimpleLine {
                is_error: false,
                len: 0,
                pending_terminator: false,
            },
            ProtocolValue::Empty,
        ),
        SIGIL_ERROR => (
            State::ReadingSimpleLine {
                is_error: true,
                len: 0,
                pending_terminator: false,
            },
            ProtocolValue::Empty,
        ),
        _ => (State::Idle, ProtocolValue::Failure),
    }
}

fn read_length(
    kind: LengthKind,
    digits: i64,
    sign: i64,
    pending_terminator: bool,
    byte: u8,
    scratch: &mut [u8],
) -> (State, ProtocolValue) {
    match byte {
        b'\r' if !pending_terminator => (
            State::ReadingLength {
                kind,
                digits,
                sign,
                pending_terminator: true,
            },
            ProtocolValue::Empty,
        ),
        b'\n' if pending_terminator => finish_length(kind, digits * sign, scratch),
        b'-' if !pending_terminator && digits == 0 && sign > 0 => (
            State::ReadingLength {
                kind,
                digits,
                sign: -1,
                pending_terminator: false,
            },
            ProtocolValue::Empty,
        ),
        b'0'..=b'9' if !pending_terminator => {
            let next = digits
                .checked_mul(10)
                .and_then(|d| d.checked_add(i64::from(byte - b'0')));
            match next {
                Some(digits) => (
                    State::ReadingLength {
                        kind,
                        digits,
                        sign,
                        pending_terminator: false,
                    },
                    ProtocolValue::Empty,
                ),
                None => {
                    warn!("length line overflowed while parsing");
                    (State::Idle, ProtocolValue::Failure)
                }
            }
        }
        _ => (State::Idle, ProtocolValue::Failure),
    }
}

fn finish_length(kind: LengthKind, value: i64, scratch: &mut [u8]) -> (State, ProtocolValue) {
    match kind {
        LengthKind::Integer => (State::Idle, ProtocolValue::Integer { value }),
        LengthKind::Array => {
            if value < 0 {
                // Null array; nothing follows.
                return (State::Idle, ProtocolValue::ArrayHeader { count: -1 });
            }
            match i32::try_from(value) {
                Ok(count) => (State::Idle, ProtocolValue::ArrayHeader { count }),
                Err(_) => (State::Idle, ProtocolValue::Failure),
            }
        }
        LengthKind::Bulk => {
            if value < 0 {
                // Null bulk; no body or trailing CRLF follows.
                return (State::Idle, ProtocolValue::BulkRead { length: -1 });
            }
            if value as u64 > scratch.len() as u64 {
                warn!(
                    "declared bulk length {} exceeds scratch capacity {}",
                    value,
                    scratch.len()
                );
                return (State::Idle, ProtocolValue::Failure);
            }
            if value == 0 {
                (
                    State::Draining {
                        length: 0,
                        pending_terminator: false,
                    },
                    ProtocolValue::Empty,
                )
            } else {
                (
                    State::ReadingBulkBody {
                        remaining: value as usize,
                        seen: 0,
                    },
                    ProtocolValue::Empty,
                )
            }
        }
    }
}

fn read_body(remaining: usize, seen: usize, byte: u8, scratch: &mut [u8]) -> (State, ProtocolValue) {
    if seen >= scratch.len() {
        // Unreachable when the header check passed; kept as a hard stop.
        return (State::Idle, ProtocolValue::Failure);
    }

    scratch[seen] = byte;
    let seen = seen + 1;
    let remaining = remaining - 1;

    if remaining == 0 {
        (
            State::Draining {
                length: seen as i32,
                pending_terminator: false,
            },
            ProtocolValue::Empty,
        )
    } else {
        (State::ReadingBulkBody { remaining, seen }, ProtocolValue::Empty)
    }
}

fn read_line(
    is_error: bool,
    len: usize,
    pending_terminator: bool,
    byte: u8,
    scratch: &mut [u8],
) -> (State, ProtocolValue) {
    match byte {
        b'\r' if !pending_terminator => (
            State::ReadingSimpleLine {
                is_error,
                len,
                pending_terminator: true,
            },
            ProtocolValue::Empty,
        ),
        b'\n' if pending_terminator => (State::Idle, ProtocolValue::SimpleReply { is_error, len }),
        _ if pending_terminator => (State::Idle, ProtocolValue::Failure),
        _ => {
            if len >= scratch.len() {
                warn!("simple line overflowed scratch capacity {}", scratch.len());
                return (State::Idle, ProtocolValue::Failure);
            }
            scratch[len] = byte;
            (
                State::ReadingSimpleLine {
                    is_error,
                    len: len + 1,
                    pending_terminator: false,
                },
                ProtocolValue::Empty,
            )
        }
    }
}

fn drain(length: i32, pending_terminator: bool, byte: u8) -> (State, ProtocolValue) {
    match byte {
        b'\r' if !pending_terminator => (
            State::Draining {
                length,
                pending_terminator: true,
            },
            ProtocolValue::Empty,
        ),
        b'\n' if pending_terminator => (State::Idle, ProtocolValue::BulkRead { length }),
        _ => {
            warn!("bulk body ran past its declared length");
            (State::Idle, ProtocolValue::Failure)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Feed a whole stream and collect every completed value.
    fn collect(stream: &[u8], scratch: &mut [u8]) -> Vec<ProtocolValue> {
        let mut reader = ReplyReader::new();
        let mut values = Vec::new();
        for byte in stream {
            let value = reader.feed(*byte, scratch);
            if value.is_complete() {
                values.push(value);
            }
        }
        values
    }

    #[test]
    fn test_simple_line() {
        let mut scratch = [0u8; 64];
        let values = collect(b"+OK\r\n", &mut scratch);
        assert_eq!(
            values,
            vec![ProtocolValue::SimpleReply {
                is_error: false,
                len: 2
            }]
        );
        assert_eq!(&scratch[..2], b"OK");
    }

    #[test]
    fn test_error_line() {
        let mut scratch = [0u8; 128];
        let values = collect(b"-WRONGPASS invalid username-password pair or user is disabled\r\n", &mut scratch);
        assert_eq!(values.len(), 1);
        match values[0] {
            ProtocolValue::SimpleReply { is_error, len } => {
                assert!(is_error);
                assert!(scratch[..len].starts_with(b"WRONGPASS"));
            }
            other => panic!("unexpected value: {:?}", other),
        }
    }

    #[test]
    fn test_integer_line() {
        let mut scratch = [0u8; 16];
        assert_eq!(
            collect(b":123\r\n", &mut scratch),
            vec![ProtocolValue::Integer { value: 123 }]
        );
        assert_eq!(
            collect(b":-7\r\n", &mut scratch),
            vec![ProtocolValue::Integer { value: -7 }]
        );
    }

    #[test]
    fn test_bulk_payload() {
        let mut scratch = [0u8; 16];
        let values = collect(b"$5\r\nhello\r\n", &mut scratch);
        assert_eq!(values, vec![ProtocolValue::BulkRead { length: 5 }]);
        assert_eq!(&scratch[..5], b"hello");
    }

    #[test]
    fn test_zero_length_bulk() {
        let mut scratch = [0u8; 16];
        let values = collect(b"$0\r\n\r\n", &mut scratch);
        assert_eq!(values, vec![ProtocolValue::BulkRead { length: 0 }]);
    }

    #[test]
    fn test_null_bulk_skips_body_phase() {
        let mut scratch = [0u8; 16];
        let mut reader = ReplyReader::new();

        for byte in b"$-1\r" {
            assert_eq!(reader.feed(*byte, &mut scratch), ProtocolValue::Empty);
        }
        assert_eq!(
            reader.feed(b'\n', &mut scratch),
            ProtocolValue::BulkRead { length: -1 }
        );
        // The very next byte starts a fresh value rather than a body.
        assert!(reader.is_idle());
    }

    #[test]
    fn test_null_array() {
        let mut scratch = [0u8; 16];
        let values = collect(b"*-1\r\n", &mut scratch);
        assert_eq!(values, vec![ProtocolValue::ArrayHeader { count: -1 }]);
    }

    #[test]
    fn test_array_with_elements() {
        let mut scratch = [0u8; 32];
        let mut reader = ReplyReader::new();
        let mut values = Vec::new();
        let mut payloads: Vec<Vec<u8>> = Vec::new();

        for byte in b"*2\r\n$2\r\nob\r\n$5\r\nhello\r\n" {
            let value = reader.feed(*byte, &mut scratch);
            if let ProtocolValue::BulkRead { length } = value {
                payloads.push(scratch[..length as usize].to_vec());
            }
            if value.is_complete() {
                values.push(value);
            }
        }

        assert_eq!(
            values,
            vec![
                ProtocolValue::ArrayHeader { count: 2 },
                ProtocolValue::BulkRead { length: 2 },
                ProtocolValue::BulkRead { length: 5 },
            ]
        );
        assert_eq!(payloads, vec![b"ob".to_vec(), b"hello".to_vec()]);
    }

    #[test]
    fn test_array_of_one_empty_payload() {
        let mut scratch = [0u8; 16];
        let values = collect(b"*1\r\n$0\r\n\r\n", &mut scratch);
        assert_eq!(
            values,
            vec![
                ProtocolValue::ArrayHeader { count: 1 },
                ProtocolValue::BulkRead { length: 0 },
            ]
        );
    }

    #[test]
    fn test_resync_after_failure() {
        let mut scratch = [0u8; 16];
        let mut reader = ReplyReader::new();

        // Declared three bytes but ran long: the drain sees 'X'.
        let mut saw_failure = false;
        for byte in b"$3\r\nabcX" {
            if reader.feed(*byte, &mut scratch) == ProtocolValue::Failure {
                saw_failure = true;
            }
        }
        assert!(saw_failure);
        assert!(reader.is_idle());

        // The stream recovers at the next sigil.
        let mut values = Vec::new();
        for byte in b"+OK\r\n" {
            let value = reader.feed(*byte, &mut scratch);
            if value.is_complete() {
                values.push(value);
            }
        }
        assert_eq!(
            values,
            vec![ProtocolValue::SimpleReply {
                is_error: false,
                len: 2
            }]
        );
    }

    #[test]
    fn test_declared_length_beyond_scratch_fails_before_copy() {
        let mut scratch = [0u8; 4];
        let values = collect(b"$9\r\n", &mut scratch);
        assert_eq!(values, vec![ProtocolValue::Failure]);
        assert_eq!(scratch, [0u8; 4]);
    }

    #[test]
    fn test_length_overflow_is_failure() {
        let mut scratch = [0u8; 16];
        let values = collect(b":99999999999999999999999\r\n", &mut scratch);
        assert_eq!(values, vec![ProtocolValue::Failure]);
    }

    #[test]
    fn test_garbage_byte_is_failure() {
        let mut scratch = [0u8; 16];
        assert_eq!(collect(b"x", &mut scratch), vec![ProtocolValue::Failure]);
    }

    #[test]
    fn test_bare_carriage_return_inside_length_fails_without_newline() {
        let mut scratch = [0u8; 16];
        let values = collect(b"*2\rx\n", &mut scratch);
        assert!(values.contains(&ProtocolValue::Failure));
    }

    #[test]
    fn test_back_to_back_values_reuse_scratch() {
        let mut scratch = [0u8; 16];
        let mut reader = ReplyReader::new();
        let mut seen = Vec::new();

        for byte in b"$3\r\nabc\r\n$2\r\nzz\r\n" {
            if let ProtocolValue::BulkRead { length } = reader.feed(*byte, &mut scratch) {
                seen.push(scratch[..length as usize].to_vec());
            }
        }

        assert_eq!(seen, vec![b"abc".to_vec(), b"zz".to_vec()]);
    }
}
