//! Fixed-capacity table of periodic message definitions.

use ve_protocol::MessageDefinition;

/// Maximum number of periodic messages one node can own.
pub const REGISTRY_CAPACITY: usize = 32;

/// Result of `MessageRegistry::define`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefineOutcome {
    Inserted,
    /// A definition for this id already exists; the new one was dropped.
    Duplicate,
    /// All slots are taken; the definition was dropped.
    RegistryFull,
    /// Id 0 marks free slots and cannot be defined.
    InvalidId,
}

/// Periodic message table. A slot whose id is 0 is free.
#[derive(Debug, Clone)]
pub struct MessageRegistry {
    slots: [MessageDefinition; REGISTRY_CAPACITY],
}

impl MessageRegistry {
    pub fn new() -> Self {
        Self {
            slots: [MessageDefinition::new(0, 0, false, 0); REGISTRY_CAPACITY],
        }
    }

    /// Claim the first free slot for `def`.
    pub fn define(&mut self, def: MessageDefinition) -> DefineOutcome {
        if def.id == 0 {
            tracing::warn!("refusing to define message with id 0");
            return DefineOutcome::InvalidId;
        }
        if self.get(def.id).is_some() {
            tracing::warn!(id = %format_args!("0x{:03X}", def.id), "duplicate message definition dropped");
            return DefineOutcome::Duplicate;
        }
        match self.slots.iter_mut().find(|slot| slot.id == 0) {
            Some(slot) => {
                *slot = def;
                tracing::debug!(
                    id = %format_args!("0x{:03X}", def.id),
                    period_ms = def.period_ms,
                    dlc = def.dlc,
                    "message defined"
                );
                DefineOutcome::Inserted
            }
            None => {
                tracing::warn!(
                    id = %format_args!("0x{:03X}", def.id),
                    capacity = REGISTRY_CAPACITY,
                    "message registry full, definition dropped"
                );
                DefineOutcome::RegistryFull
            }
        }
    }

    pub fn get(&self, id: u32) -> Option<&MessageDefinition> {
        if id == 0 {
            return None;
        }
        self.slots.iter().find(|slot| slot.id == id)
    }

    /// Occupied slots in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &MessageDefinition> {
        self.slots.iter().filter(|slot| slot.id != 0)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MessageRegistry {
    fn default() -> Self {
        Self::new()
    }
}
