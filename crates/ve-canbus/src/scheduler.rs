//! Periodic transmission of registered messages.

use std::time::Duration;

use ve_protocol::{MessageDefinition, VehicleState};

use crate::bus::SecureBus;
use crate::layout::format_message;
use crate::registry::{DefineOutcome, MessageRegistry};
use crate::timing::TimingTable;

/// A message may fire this many microseconds before its period elapses.
pub const DEFAULT_EARLY_FIRE_US: u64 = 300;
/// Pause after each transmitted frame.
pub const DEFAULT_SPACING: Duration = Duration::from_micros(10);

/// Sends every enabled definition whose period has elapsed.
#[derive(Debug, Clone)]
pub struct Scheduler {
    registry: MessageRegistry,
    last_send: TimingTable,
    early_fire_us: u64,
    spacing: Duration,
}

impl Scheduler {
    pub fn new(registry: MessageRegistry) -> Self {
        Self {
            registry,
            last_send: TimingTable::new(),
            early_fire_us: DEFAULT_EARLY_FIRE_US,
            spacing: DEFAULT_SPACING,
        }
    }

    pub fn with_timing(mut self, early_fire_us: u64, spacing: Duration) -> Self {
        self.early_fire_us = early_fire_us;
        self.spacing = spacing;
        self
    }

    pub fn define(&mut self, def: MessageDefinition) -> DefineOutcome {
        self.registry.define(def)
    }

    pub fn registry(&self) -> &MessageRegistry {
        &self.registry
    }

    /// Last transmit time of `id` in microseconds, if it was ever sent.
    pub fn last_send(&self, id: u32) -> Option<u64> {
        self.last_send.get(id)
    }

    fn is_due(&self, def: &MessageDefinition, now_us: u64) -> bool {
        let Some(last) = self.last_send.get(def.id) else {
            return true;
        };
        let remaining = def.period_us() as i64 - (now_us as i64 - last as i64);
        remaining < self.early_fire_us as i64
    }

    /// Ids that `tick` would transmit at `now_us`, in registry order.
    pub fn due(&self, now_us: u64) -> Vec<u32> {
        self.registry
            .iter()
            .filter(|def| def.enabled && self.is_due(def, now_us))
            .map(|def| def.id)
            .collect()
    }

    /// Transmit every due message. Returns how many definitions fired.
    ///
    /// The send timestamp advances even when formatting or the transmit
    /// fails, so a broken message never starves the others.
    pub async fn tick(&mut self, now_us: u64, state: &VehicleState, bus: &SecureBus) -> usize {
        let due: Vec<MessageDefinition> = self
            .registry
            .iter()
            .filter(|def| def.enabled && self.is_due(def, now_us))
            .copied()
            .collect();

        for def in &due {
            let result = match format_message(def, state) {
                Ok(msg) => bus.send(&msg).await,
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                tracing::warn!(
                    id = %format_args!("0x{:03X}", def.id),
                    error = %e,
                    "failed to send periodic message"
                );
            }
            self.last_send.set(def.id, now_us);
            if !self.spacing.is_zero() {
                // Blocking on purpose: the pause is below the tokio timer resolution.
                std::thread::sleep(self.spacing);
            }
        }

        due.len()
    }
}
