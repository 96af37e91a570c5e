//! Gateway allow-lists.
//!
//! The read list governs inner → outer traffic (what diagnostic tools may
//! see), the write list outer → inner traffic (what they may inject).

use ve_protocol::{BRAKE_OUTPUT_IND_MSG, CAN_ID_SPACE, KNOWN_MESSAGES};

/// Immutable per-id allow-lists for both gateway directions.
#[derive(Debug, Clone)]
pub struct GatewayPolicy {
    read: Vec<bool>,
    write: Vec<bool>,
}

impl GatewayPolicy {
    /// Build from explicit id lists. Ids above 0xFFF are ignored.
    pub fn new<R, W>(read: R, write: W) -> Self
    where
        R: IntoIterator<Item = u32>,
        W: IntoIterator<Item = u32>,
    {
        Self {
            read: bitmap(read),
            write: bitmap(write),
        }
    }

    /// Every known id is readable except the brake output; nothing is writable.
    pub fn defaults() -> Self {
        Self::new(default_read_list(), std::iter::empty())
    }

    /// Whether `id` may be forwarded from the inner to the outer segment.
    pub fn read_allowed(&self, id: u32) -> bool {
        self.read.get(id as usize).copied().unwrap_or(false)
    }

    /// Whether `id` may be forwarded from the outer to the inner segment.
    pub fn write_allowed(&self, id: u32) -> bool {
        self.write.get(id as usize).copied().unwrap_or(false)
    }
}

impl Default for GatewayPolicy {
    fn default() -> Self {
        Self::defaults()
    }
}

pub fn default_read_list() -> Vec<u32> {
    KNOWN_MESSAGES
        .iter()
        .map(|(id, _, _)| *id)
        .filter(|id| *id != BRAKE_OUTPUT_IND_MSG)
        .collect()
}

fn bitmap(ids: impl IntoIterator<Item = u32>) -> Vec<bool> {
    let mut map = vec![false; CAN_ID_SPACE];
    for id in ids {
        match map.get_mut(id as usize) {
            Some(slot) => *slot = true,
            None => tracing::warn!(id = %format_args!("0x{id:X}"), "allow-list id out of range, ignored"),
        }
    }
    map
}
