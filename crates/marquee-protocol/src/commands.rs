//! Commands the device sends to the queue server.
//!
//! Every command goes on the wire as an array of bulk strings:
//!
//! ```text
//! *3\r\n$4\r\nAUTH\r\n$6\r\ndevice\r\n$6\r\nsecret\r\n
//! ```

use bytes::{BufMut, BytesMut};

use crate::constants::{
    CMD_AUTH, CMD_BLPOP, CMD_LPOP, CMD_RPUSH, CRLF, DEVICE_QUEUE_PREFIX, HEARTBEAT_QUEUE,
    MAX_COMMAND_LEN, MAX_IDENTITY_LEN, POP_BLOCK_SECS, REGISTRATION_QUEUE, SIGIL_ARRAY, SIGIL_BULK,
};
use crate::error::{ProtocolError, ProtocolResult};

/// Commands the device sends to the queue server.
///
/// Arguments are borrowed; a command is built at the call site and encoded
/// immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    /// `AUTH <username> <password>`. First command on every connection.
    Authorize {
        /// Account name; the burn-in name before registration, the assigned
        /// identity afterwards.
        username: &'a [u8],
        /// Matching password.
        password: &'a [u8],
    },

    /// `LPOP ob:r`. Claim one freshly provisioned identity off the
    /// registration queue.
    PopRegistration,

    /// `BLPOP ob:<identity> 5`. Wait for the next queued message addressed
    /// to this device.
    PopMessage {
        /// Identity naming the device's queue.
        identity: &'a [u8],
    },

    /// `RPUSH ob:i <identity>`. Report the device alive.
    PushHeartbeat {
        /// Identity to report.
        identity: &'a [u8],
    },
}

impl Command<'_> {
    /// The command word, for logging.
    pub fn word(&self) -> &'static str {
        match self {
            Command::Authorize { .. } => CMD_AUTH,
            Command::PopRegistration => CMD_LPOP,
            Command::PopMessage { .. } => CMD_BLPOP,
            Command::PushHeartbeat { .. } => CMD_RPUSH,
        }
    }

    /// Encode the command to wire bytes.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        match self {
            Command::Authorize { username, password } => {
                encode_array(&[CMD_AUTH.as_bytes(), username, password])
            }

            Command::PopRegistration => {
                encode_array(&[CMD_LPOP.as_bytes(), REGISTRATION_QUEUE.as_bytes()])
            }

            Command::PopMessage { identity } => {
                check_identity(identity)?;
                let queue = device_queue(identity);
                encode_array(&[CMD_BLPOP.as_bytes(), &queue, POP_BLOCK_SECS.as_bytes()])
            }

            Command::PushHeartbeat { identity } => {
                check_identity(identity)?;
                encode_array(&[CMD_RPUSH.as_bytes(), HEARTBEAT_QUEUE.as_bytes(), identity])
            }
        }
    }
}

/// Name of the message queue belonging to `identity`.
fn device_queue(identity: &[u8]) -> Vec<u8> {
    let mut queue = Vec::with_capacity(DEVICE_QUEUE_PREFIX.len() + identity.len());
    queue.extend_from_slice(DEVICE_QUEUE_PREFIX.as_bytes());
    queue.extend_from_slice(identity);
    queue
}

fn check_identity(identity: &[u8]) -> ProtocolResult<()> {
    if identity.len() > MAX_IDENTITY_LEN {
        return Err(ProtocolError::ArgumentTooLong {
            max: MAX_IDENTITY_LEN,
            actual: identity.len(),
        });
    }
    Ok(())
}

/// Encode `args` as an array of bulk strings.
fn encode_array(args: &[&[u8]]) -> ProtocolResult<Vec<u8>> {
    let mut buf = BytesMut::with_capacity(MAX_COMMAND_LEN);

    buf.put_u8(SIGIL_ARRAY);
    buf.put_slice(args.len().to_string().as_bytes());
    buf.put_slice(CRLF);

    for arg in args {
        buf.put_u8(SIGIL_BULK);
        buf.put_slice(arg.len().to_string().as_bytes());
        buf.put_slice(CRLF);
        buf.put_slice(arg);
        buf.put_slice(CRLF);
    }

    if buf.len() > MAX_COMMAND_LEN {
        return Err(ProtocolError::CommandOverflow {
            max: MAX_COMMAND_LEN,
            actual: buf.len(),
        });
    }

    Ok(buf.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::ReplyReader;
    use crate::responses::ProtocolValue;

    #[test]
    fn test_encode_authorize() {
        let command = Command::Authorize {
            username: b"device",
            password: b"secret",
        };
        assert_eq!(
            command.encode().unwrap(),
            b"*3\r\n$4\r\nAUTH\r\n$6\r\ndevice\r\n$6\r\nsecret\r\n"
        );
    }

    #[test]
    fn test_encode_pop_registration() {
        assert_eq!(
            Command::PopRegistration.encode().unwrap(),
            b"*2\r\n$4\r\nLPOP\r\n$4\r\nob:r\r\n"
        );
    }

    #[test]
    fn test_encode_pop_message() {
        let command = Command::PopMessage { identity: b"dev-1" };
        assert_eq!(
            command.encode().unwrap(),
            b"*3\r\n$5\r\nBLPOP\r\n$8\r\nob:dev-1\r\n$1\r\n5\r\n"
        );
    }

    #[test]
    fn test_encode_push_heartbeat() {
        let command = Command::PushHeartbeat { identity: b"dev-1" };
        assert_eq!(
            command.encode().unwrap(),
            b"*3\r\n$5\r\nRPUSH\r\n$4\r\nob:i\r\n$5\r\ndev-1\r\n"
        );
    }

    #[test]
    fn test_oversized_identity_is_rejected() {
        let identity = [b'a'; MAX_IDENTITY_LEN + 1];
        let command = Command::PopMessage {
            identity: &identity,
        };
        assert!(matches!(
            command.encode(),
            Err(ProtocolError::ArgumentTooLong { .. })
        ));
    }

    #[test]
    fn test_oversized_command_is_rejected() {
        let password = vec![b'p'; MAX_COMMAND_LEN];
        let command = Command::Authorize {
            username: b"device",
            password: &password,
        };
        assert!(matches!(
            command.encode(),
            Err(ProtocolError::CommandOverflow { .. })
        ));
    }

    #[test]
    fn test_encoded_command_parses_back() {
        let encoded = Command::PushHeartbeat { identity: b"dev-1" }
            .encode()
            .unwrap();

        let mut reader = ReplyReader::new();
        let mut scratch = [0u8; 64];
        let mut values = Vec::new();
        for byte in &encoded {
            let value = reader.feed(*byte, &mut scratch);
            if value.is_complete() {
                values.push(value);
            }
        }

        assert_eq!(
            values,
            vec![
                ProtocolValue::ArrayHeader { count: 3 },
                ProtocolValue::BulkRead { length: 5 },
                ProtocolValue::BulkRead { length: 4 },
                ProtocolValue::BulkRead { length: 5 },
            ]
        );
        assert!(reader.is_idle());
    }
}
