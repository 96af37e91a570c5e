//! Decoded bus messages and periodic message definitions.

use serde::{Deserialize, Serialize};

/// Largest CAN-FD data field.
pub const MAX_PAYLOAD: usize = 64;

/// A decoded CAN message as handled by the ECU logic.
///
/// Always copied by value between layers; the payload is a fixed buffer so
/// handlers can index the documented byte offsets without bounds juggling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanMessage {
    pub id: u32,
    /// Number of meaningful payload bytes (0–64).
    pub length: u8,
    pub payload: [u8; MAX_PAYLOAD],
}

impl CanMessage {
    /// Empty message of `length` bytes for `id`.
    pub fn new(id: u32, length: u8) -> Self {
        Self {
            id,
            length,
            payload: [0; MAX_PAYLOAD],
        }
    }

    /// Message whose payload starts with `data` (truncated to 64 bytes).
    pub fn with_data(id: u32, data: &[u8]) -> Self {
        let len = data.len().min(MAX_PAYLOAD);
        let mut msg = Self::new(id, len as u8);
        msg.payload[..len].copy_from_slice(&data[..len]);
        msg
    }

    /// Big-endian u16 at `offset`.
    pub fn u16_be(&self, offset: usize) -> u16 {
        u16::from_be_bytes([self.payload[offset], self.payload[offset + 1]])
    }

    /// Write `value` as a big-endian u16 at `offset`.
    pub fn put_u16_be(&mut self, offset: usize, value: u16) {
        self.payload[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
    }

    /// The meaningful part of the payload.
    pub fn data(&self) -> &[u8] {
        &self.payload[..(self.length as usize).min(MAX_PAYLOAD)]
    }
}

/// A periodic outbound message owned by an ECU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDefinition {
    /// CAN id; 0 marks an unused registry slot.
    pub id: u32,
    /// Data length code (bytes).
    pub dlc: u8,
    /// Only enabled definitions are scheduled.
    pub enabled: bool,
    /// Transmit period in milliseconds.
    pub period_ms: u32,
}

impl MessageDefinition {
    pub fn new(id: u32, dlc: u8, enabled: bool, period_ms: u32) -> Self {
        Self {
            id,
            dlc,
            enabled,
            period_ms,
        }
    }

    pub fn period_us(&self) -> u64 {
        u64::from(self.period_ms) * 1000
    }
}
