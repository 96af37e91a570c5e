//! Per-id timestamp tables.

use ve_protocol::{CAN_ID_SPACE, KNOWN_MESSAGES};

/// A value per CAN id in `0..=0xFFF`.
///
/// Every access is bounds-checked; ids outside the table read as `None` and
/// writes to them are ignored.
#[derive(Debug, Clone)]
pub struct TimingTable {
    entries: Vec<Option<u64>>,
}

impl TimingTable {
    pub fn new() -> Self {
        Self {
            entries: vec![None; CAN_ID_SPACE],
        }
    }

    /// Reference periods in milliseconds for every known id.
    pub fn reference_defaults() -> Self {
        let mut table = Self::new();
        for (id, class, _) in KNOWN_MESSAGES {
            table.set(*id, u64::from(class.period_ms()));
        }
        table
    }

    pub fn get(&self, id: u32) -> Option<u64> {
        self.entries.get(id as usize).copied().flatten()
    }

    /// Store `value` for `id`. Returns `false` if the id is out of range.
    pub fn set(&mut self, id: u32, value: u64) -> bool {
        match self.entries.get_mut(id as usize) {
            Some(slot) => {
                *slot = Some(value);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self, id: u32) {
        if let Some(slot) = self.entries.get_mut(id as usize) {
            *slot = None;
        }
    }
}

impl Default for TimingTable {
    fn default() -> Self {
        Self::new()
    }
}
