//! Command-line entry point for the marquee queue client.

use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use marquee_runner::{load_config, run, RunnerConfig, RunnerError};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Queue client for marquee display devices.
#[derive(Debug, Parser)]
#[command(name = "marquee", version, about)]
struct Args {
    /// YAML config file; the flags below override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Queue server host.
    #[arg(long)]
    host: Option<String>,

    /// Queue server port.
    #[arg(long)]
    port: Option<u16>,

    /// Burn-in username used until the device owns an identity.
    #[arg(long)]
    username: Option<String>,

    /// Burn-in password.
    #[arg(long)]
    password: Option<String>,

    /// Directory for persisted state such as the device identity.
    #[arg(long)]
    state_dir: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = match build_config(&args) {
        Ok(config) => config,
        Err(error) => {
            error!("{}", error);
            process::exit(1);
        }
    };

    let shutdown = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&shutdown);
    if let Err(error) = ctrlc::set_handler(move || {
        info!("shutdown requested");
        handler_flag.store(true, Ordering::Relaxed);
    }) {
        error!("failed to install the signal handler: {}", error);
        process::exit(1);
    }

    if let Err(error) = run(config, shutdown) {
        error!("{}", error);
        process::exit(1);
    }
}

fn build_config(args: &Args) -> Result<RunnerConfig, RunnerError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => RunnerConfig::default(),
    };
    if let Some(host) = &args.host {
        config.client.host = host.clone();
    }
    if let Some(port) = args.port {
        config.client.port = port;
    }
    if let Some(username) = &args.username {
        config.client.username = username.clone();
    }
    if let Some(password) = &args.password {
        config.client.password = password.clone();
    }
    if let Some(state_dir) = &args.state_dir {
        config.state_dir = state_dir.clone();
    }
    config.client.validate()?;
    Ok(config)
}
