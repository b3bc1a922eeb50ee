//! Marquee Queue Server Wire Protocol
//!
//! This crate provides types and utilities for talking to the queue server a
//! marquee device pulls its display messages from. The server speaks a small
//! subset of the RESP wire format: arrays, bulk strings, integers, and
//! simple/error lines.
//!
//! # Protocol Overview
//!
//! Everything the device sends is an array of bulk strings:
//!
//! ```text
//! *<argc>\r\n
//! $<len>\r\n<arg>\r\n      (repeated argc times)
//! ```
//!
//! Replies come back as one of:
//!
//! - **Simple lines**: `+OK\r\n` (success) or `-WRONGPASS ...\r\n` (errors)
//! - **Integers**: `:1\r\n`
//! - **Bulk strings**: `$5\r\nhello\r\n`, with `$-1\r\n` meaning null
//! - **Arrays**: `*2\r\n` followed by that many elements, with `*-1\r\n`
//!   meaning null
//!
//! # Reading
//!
//! The device reads from a non-blocking socket, so replies arrive in
//! arbitrary fragments. [`ReplyReader`] is an incremental parser fed one byte
//! at a time; payload bytes are copied into a scratch buffer owned by the
//! caller and the reader itself never allocates.
//!
//! # Example
//!
//! ```rust,ignore
//! use marquee_protocol::{Command, ProtocolValue, ReplyReader};
//!
//! // Build a command
//! let bytes = Command::PopRegistration.encode()?;
//!
//! // Parse a reply
//! let mut reader = ReplyReader::new();
//! let mut scratch = [0u8; 64];
//! for byte in b"+OK\r\n" {
//!     let value = reader.feed(*byte, &mut scratch);
//! }
//! ```

mod commands;
mod constants;
mod error;
mod reader;
mod responses;

pub use commands::*;
pub use constants::*;
pub use error::*;
pub use reader::*;
pub use responses::*;
