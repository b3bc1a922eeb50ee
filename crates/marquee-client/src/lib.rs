//! Queue-server client for marquee display devices.
//!
//! A marquee device bootstraps an identity from the queue server, then
//! alternates between popping messages addressed to it and pushing
//! heartbeats announcing it is alive. This crate holds the whole client as
//! a single-threaded, tick-driven state machine:
//!
//! - [`Client::advance`] is called once per scheduler tick with the current
//!   time and whatever the platform's network stack reported since the last
//!   tick. It never blocks; socket I/O is strictly "read what is available
//!   now".
//! - Progress worth surfacing (connection established, identity assigned,
//!   message arrived) comes back as a [`ClientEvent`], at most one per tick.
//! - Received messages land in a fixed-capacity [`MessageRing`] that a
//!   renderer walks newest-first between ticks.
//!
//! The client is generic over a [`Transport`] (byte stream to the server)
//! and an [`IdentityStore`] (persistence for the assigned identity), so the
//! whole protocol flow can be exercised against scripted bytes; see
//! [`ScriptedTransport`].

mod budget;
mod client;
mod config;
mod error;
mod events;
mod ring;
mod store;
mod timer;
mod transport;

pub use budget::*;
pub use client::*;
pub use config::*;
pub use error::*;
pub use events::*;
pub use ring::*;
pub use store::*;
pub use timer::*;
pub use transport::*;
