//! Wire-level CAN-FD frame type and bus constants.

use std::time::Duration;

use ve_protocol::MAX_PAYLOAD;

/// Kernel MTU reported by a CAN FD capable netdevice (`sizeof(struct canfd_frame)`).
pub const CANFD_MTU: u32 = 72;

/// Every outbound frame carries the full CAN FD data field.
pub const WIRE_FRAME_LEN: usize = MAX_PAYLOAD;

/// Receive poll timeout; the main loop never waits longer than this on the bus.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_micros(100);

// ── CAN Frame ───────────────────────────────────────────────────

/// A raw CAN FD frame as it travels on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanFrame {
    /// CAN arbitration ID.
    pub id: u32,
    /// Data field (0–64 bytes).
    pub data: Vec<u8>,
}

impl CanFrame {
    pub fn new(id: u32, data: Vec<u8>) -> Self {
        Self { id, data }
    }

    /// Hex dump of the data field for log lines.
    pub fn hex_data(&self) -> String {
        self.data
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_dump() {
        let frame = CanFrame::new(0x1a, vec![0x00, 0x32, 0xFF]);
        assert_eq!(frame.hex_data(), "00 32 FF");
    }
}
