//! Shared test harness for E2E integration tests.
//!
//! Joins real `EcuNode`s through in-memory `VirtualCanBus` segments: the
//! inner vehicle bus and the outer OBD segment behind the gateway. Probes
//! are extra bus endpoints a test uses to inject or capture frames.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use ve_canbus::mock::VirtualCanPort;
use ve_canbus::{FrameCodec, SecureBus, VirtualCanBus};
use ve_node::{EcuNode, NodeConfig};
use ve_protocol::{CanMessage, EcuRole};

/// 32-byte key, hex encoded.
pub const TEST_KEY: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";
pub const OTHER_KEY: &str = "ffeeddccbbaa99887766554433221100ffeeddccbbaa99887766554433221100";

pub const POLL: Duration = Duration::from_micros(100);

/// Defaults with the inter-frame pause disabled so tests run quickly.
pub fn test_config() -> NodeConfig {
    let mut config = NodeConfig::default();
    config.scheduler.spacing_us = 0;
    config
}

/// Two bus segments sharing one codec.
pub struct Network {
    pub inner: VirtualCanBus,
    pub outer: VirtualCanBus,
    pub codec: Arc<FrameCodec>,
}

impl Network {
    pub fn plaintext() -> Self {
        Self::with_codec(FrameCodec::plaintext())
    }

    pub fn encrypted() -> Self {
        Self::with_codec(FrameCodec::from_secret(Some(TEST_KEY)).unwrap())
    }

    fn with_codec(codec: FrameCodec) -> Self {
        Self {
            inner: VirtualCanBus::new(),
            outer: VirtualCanBus::new(),
            codec: Arc::new(codec),
        }
    }

    /// A node attached to the inner segment (and the outer one for the gateway).
    pub fn node(&self, role: EcuRole) -> EcuNode {
        self.node_with(role, &test_config())
    }

    pub fn node_with(&self, role: EcuRole, config: &NodeConfig) -> EcuNode {
        let inner = self.secure(&self.inner, "vcan0");
        let outer = (role == EcuRole::Gateway).then(|| self.secure(&self.outer, "vcan1"));
        EcuNode::new(role, config, inner, outer).unwrap()
    }

    /// Extra inner-segment endpoint using the network's codec.
    pub fn probe(&self) -> SecureBus {
        self.secure(&self.inner, "probe-inner")
    }

    /// Extra outer-segment endpoint, standing in for an OBD dongle.
    pub fn obd_probe(&self) -> SecureBus {
        self.secure(&self.outer, "probe-obd")
    }

    /// Inner-segment endpoint with its own codec.
    pub fn probe_with(&self, codec: FrameCodec) -> SecureBus {
        SecureBus::new("probe-foreign", Arc::new(self.inner.attach()), Arc::new(codec))
    }

    /// Raw inner-segment port for counting frames without decoding.
    pub fn listener(&self) -> VirtualCanPort {
        self.inner.attach()
    }

    fn secure(&self, bus: &VirtualCanBus, name: &str) -> SecureBus {
        SecureBus::new(name, Arc::new(bus.attach()), self.codec.clone())
    }
}

/// Receive everything currently queued for `bus`.
pub async fn drain(bus: &SecureBus) -> Vec<CanMessage> {
    let mut messages = Vec::new();
    while let Some(msg) = bus.poll(POLL).await {
        messages.push(msg);
    }
    messages
}

/// Step `node` at `now_us` until `done` holds, at most `limit` times.
pub async fn step_until<F>(node: &mut EcuNode, now_us: u64, limit: usize, done: F) -> bool
where
    F: Fn(&EcuNode) -> bool,
{
    for _ in 0..limit {
        node.step_at(now_us).await;
        if done(node) {
            return true;
        }
    }
    false
}
