//! ve-node: one ECU of the virtual vehicle network.
//!
//! Binds the CAN FD segment(s), optionally opens the GUI serial link, and
//! runs the role's main loop until Ctrl-C or SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use ve_canbus::{FrameCodec, SecureBus};
use ve_node::config::{Cli, NodeConfig};
use ve_node::error::{NodeError, NodeResult};
use ve_node::runtime::EcuNode;
use ve_node::serial::SerialLink;
use ve_protocol::EcuRole;

const WORKER_THREADS: usize = 2;
const SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(500);

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        role = %cli.role,
        "ve-node starting"
    );

    if let Err(e) = run(cli) {
        tracing::error!(error = %e, exit_code = e.exit_code(), "ve-node failed");
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> NodeResult<()> {
    let config = NodeConfig::load(&cli).map_err(|e| NodeError::Config(format!("{e:#}")))?;
    let codec = Arc::new(FrameCodec::from_secret(config.key.as_deref())?);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(WORKER_THREADS)
        .thread_name("ve-node")
        .enable_all()
        .build()
        .map_err(NodeError::Runtime)?;

    let result = runtime.block_on(serve(cli.role, config, codec));
    // The GUI reader thread may sit in a blocking read; do not wait on it.
    runtime.shutdown_timeout(SHUTDOWN_TIMEOUT);
    result
}

async fn serve(role: EcuRole, config: NodeConfig, codec: Arc<FrameCodec>) -> NodeResult<()> {
    let inner = open_bus(&config.interface, codec.clone())?;
    let outer = if NodeConfig::needs_outer(role) {
        Some(open_bus(&config.outer_interface, codec)?)
    } else {
        None
    };

    let mut node = EcuNode::new(role, &config, inner, outer)?;
    match &config.serial_port {
        Some(path) => node = node.with_gui(Box::new(SerialLink::open(path)?)),
        None => tracing::info!("no serial port configured, running without GUI"),
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let relay = node.spawn_outer_relay(shutdown_rx.clone());

    tracing::info!(role = %role, "ve-node ready");

    tokio::select! {
        () = node.run(shutdown_rx) => {
            tracing::error!("main loop exited unexpectedly");
        }
        () = shutdown_signal() => {
            tracing::info!("shutdown signal received");
        }
    }

    let _ = shutdown_tx.send(true);
    if let Some(handle) = relay {
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "gateway relay task failed");
        }
    }

    tracing::info!("ve-node stopped");
    Ok(())
}

#[cfg(target_os = "linux")]
fn open_bus(name: &str, codec: Arc<FrameCodec>) -> NodeResult<SecureBus> {
    let interface = ve_canbus::SocketCanInterface::bind(name)?;
    tracing::info!(interface = name, "CAN FD interface bound");
    Ok(SecureBus::new(name, Arc::new(interface), codec))
}

#[cfg(not(target_os = "linux"))]
fn open_bus(name: &str, _codec: Arc<FrameCodec>) -> NodeResult<SecureBus> {
    Err(ve_canbus::CanError::Interface(format!("{name}: SocketCAN requires Linux")).into())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot listen for SIGTERM");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
