//! Two-segment security gateway.
//!
//! The inner segment carries the vehicle ECUs, the outer segment the OBD
//! port. Frames cross only when the allow-list for their direction permits
//! it. The main loop relays inner traffic; a background task relays outer
//! traffic.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};

use ve_canbus::{GatewayPolicy, SecureBus};
use ve_protocol::{CanMessage, GatewayCode, RelayOutcome, is_valid_id, message_name};

/// Which side of the gateway a frame arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Inner,
    Outer,
}

pub struct Gateway {
    inner: SecureBus,
    outer: SecureBus,
    policy: Arc<GatewayPolicy>,
    /// Held across the allow-list check, the forward and the verdict write.
    outcome: Mutex<RelayOutcome>,
}

impl Gateway {
    pub fn new(inner: SecureBus, outer: SecureBus, policy: Arc<GatewayPolicy>) -> Self {
        Self {
            inner,
            outer,
            policy,
            outcome: Mutex::new(RelayOutcome::default()),
        }
    }

    /// Verdict for the most recently relayed frame.
    pub async fn last_outcome(&self) -> RelayOutcome {
        *self.outcome.lock().await
    }

    /// Forward `msg` to the other segment if the policy allows it.
    ///
    /// Returns `None` for ids outside the policy tables; those are dropped
    /// without touching the recorded verdict.
    pub async fn relay(&self, msg: &CanMessage, from: Segment) -> Option<RelayOutcome> {
        if !is_valid_id(msg.id) {
            tracing::warn!(
                id = %format_args!("0x{:X}", msg.id),
                segment = ?from,
                "gateway received invalid CAN id"
            );
            return None;
        }

        let mut outcome = self.outcome.lock().await;
        *outcome = RelayOutcome::new(msg.id, GatewayCode::Ok);

        let (allowed, target, blocked) = match from {
            Segment::Inner => (
                self.policy.read_allowed(msg.id),
                &self.outer,
                GatewayCode::ReadBlocked,
            ),
            Segment::Outer => (
                self.policy.write_allowed(msg.id),
                &self.inner,
                GatewayCode::WriteBlocked,
            ),
        };

        if allowed {
            if let Err(e) = target.send(msg).await {
                tracing::warn!(
                    id = %format_args!("0x{:03X}", msg.id),
                    name = message_name(msg.id).unwrap_or("unknown"),
                    to = target.name(),
                    error = %e,
                    "gateway forward failed"
                );
            }
        } else {
            outcome.code = blocked;
            tracing::debug!(
                id = %format_args!("0x{:03X}", msg.id),
                name = message_name(msg.id).unwrap_or("unknown"),
                segment = ?from,
                code = blocked.code(),
                "gateway blocked frame"
            );
        }

        Some(*outcome)
    }

    /// Relay outer-segment traffic until `shutdown` flips to `true`.
    pub async fn run_outer(self: Arc<Self>, poll_timeout: Duration, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(bus = self.outer.name(), "gateway outer relay started");
        loop {
            if *shutdown.borrow_and_update() {
                break;
            }
            if let Some(msg) = self.outer.poll(poll_timeout).await {
                self.relay(&msg, Segment::Outer).await;
            }
            tokio::task::yield_now().await;
        }
        tracing::info!("gateway outer relay stopped");
    }
}
