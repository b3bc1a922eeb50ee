//! The wall-clock tick loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use marquee_client::{create_client, Client, ClientEvent, ConfigError, NetworkEvent};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::RunnerConfig;
use crate::store::FileStore;
use crate::transport::TcpTransport;

/// Errors surfaced by the runner.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(#[from] ConfigError),
}

/// The client wired to the host platform.
pub type DeviceClient = Client<TcpTransport, FileStore>;

/// Run the tick loop until `shutdown` flips.
///
/// The host has an OS network stack underneath, so the link is reported up
/// once at start; embedded ports feed real link events here instead.
pub fn run(config: RunnerConfig, shutdown: Arc<AtomicBool>) -> Result<(), RunnerError> {
    config.client.validate()?;
    let RunnerConfig {
        client: client_config,
        tick_ms,
        state_dir,
    } = config;

    let tick = Duration::from_millis(tick_ms.max(1));
    let mut client = create_client(client_config, TcpTransport::new(), FileStore::new(state_dir));
    info!(
        "marquee client starting against {}:{}",
        client.config().host,
        client.config().port
    );

    let start = Instant::now();
    let mut link = Some(NetworkEvent::Connected);

    while !shutdown.load(Ordering::Relaxed) {
        let now_ms = start.elapsed().as_millis() as u64;
        if let Some(event) = client.advance(link.take(), now_ms) {
            note_event(&client, event);
        }
        if client.has_unread() {
            render(&client);
            client.clear_unread();
        }
        thread::sleep(tick);
    }

    info!(
        "stopping after {} resets, {} messages, {} heartbeats",
        client.resets(),
        client.messages_received(),
        client.heartbeats_sent()
    );
    Ok(())
}

fn note_event(client: &DeviceClient, event: ClientEvent) {
    match event {
        ClientEvent::ConnectionEstablished => info!("connected to the queue server"),
        ClientEvent::IdentityReceived => match client.identity() {
            Some(identity) => info!("device identity: {}", String::from_utf8_lossy(identity)),
            None => info!("device identity received"),
        },
        ClientEvent::Authorized => info!("authorized; entering the work loop"),
        ClientEvent::MessageReceived => debug!("message received"),
        ClientEvent::ConnectionFailed => warn!("connect attempt failed; backing off"),
        ClientEvent::ConnectionLost => warn!("connection lost"),
    }
}

/// Log the ring the way the display would show it, newest first.
fn render(client: &DeviceClient) {
    for (slot, message) in client.messages().enumerate() {
        info!(
            "display[{}]: {}",
            slot,
            String::from_utf8_lossy(message.payload())
        );
    }
}
