//! Host-side runner for the marquee queue client.
//!
//! Wires the platform pieces, a non-blocking TCP transport and a
//! file-backed identity store, to the tick-driven client from
//! `marquee-client` and paces the loop against the wall clock.

pub mod config;
pub mod runner;
pub mod store;
pub mod transport;

pub use config::{load_config, RunnerConfig};
pub use runner::{run, DeviceClient, RunnerError};
pub use store::FileStore;
pub use transport::TcpTransport;
