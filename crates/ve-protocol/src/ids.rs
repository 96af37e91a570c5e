//! CAN identifiers used on the vehicle bus and their rate classes.

use serde::{Deserialize, Serialize};

/// Highest CAN id any per-id table in the system is sized for.
pub const MAX_CAN_ID: u32 = 0xFFF;

/// Number of entries in a per-id table (`0..=MAX_CAN_ID`).
pub const CAN_ID_SPACE: usize = MAX_CAN_ID as usize + 1;

// ── Powertrain outputs ──────────────────────────────────────────

/// Brake output indicator (u16 BE).
pub const BRAKE_OUTPUT_IND_MSG: u32 = 0x24;
/// Engine RPM (u16 BE) followed by speed in kph (u16 BE).
pub const ENGINE_RPM_MSG: u32 = 0x43;
/// Power steering output angle (u16 BE).
pub const POWER_STEERING_OUT_IND_MSG: u32 = 0x62;
/// Shift position as an ASCII gear character.
pub const SHIFT_POSITION_MSG: u32 = 0x77;
/// Engine running flag (bit 0).
pub const ENGINE_STATUS_MSG: u32 = 0x19a;
/// Parking brake engaged flag (bit 0).
pub const PARKING_BRAKE_STATUS_MSG: u32 = 0x1d3;

// ── Chassis inputs ──────────────────────────────────────────────

pub const BRAKE_OPERATION_MSG: u32 = 0x1a;
pub const ACCELERATION_OPERATION_MSG: u32 = 0x2f;
pub const STEERING_WHEEL_POS_MSG: u32 = 0x58;
pub const SHIFT_POSITION_SWITCH_MSG: u32 = 0x6d;
pub const ENGINE_START_MSG: u32 = 0x1b8;
pub const TURN_SWITCH_MSG: u32 = 0x83;
pub const HORN_SWITCH_MSG: u32 = 0x98;
pub const LIGHT_SWITCH_MSG: u32 = 0x1a7;
pub const PARKING_BRAKE_MSG: u32 = 0x1c9;
pub const WIPER_SWITCH_FRONT_MSG: u32 = 0x25c;
pub const WIPER_SWITCH_REAR_MSG: u32 = 0x271;
pub const DOOR_LOCK_UNLOCK_MSG: u32 = 0x286;
pub const L_WINDOW_SWITCH_MSG: u32 = 0x29c;
pub const R_WINDOW_SWITCH_MSG: u32 = 0x2b1;
pub const L_DOOR_HANDLE_MSG: u32 = 0x29d;
pub const R_DOOR_HANDLE_MSG: u32 = 0x2b2;

// ── Body outputs ────────────────────────────────────────────────

pub const TURN_SIGNAL_INDICATOR_MSG: u32 = 0x8d;
pub const DOOR_LOCK_STATUS_MSG: u32 = 0x290;
pub const L_DOOR_POSITION_MSG: u32 = 0x2bc;
pub const R_DOOR_POSITION_MSG: u32 = 0x2a7;

/// Nominal transmit rate of a periodic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageClass {
    Hz100,
    Hz20,
    Hz10,
    Hz2,
}

impl MessageClass {
    /// Nominal period in milliseconds.
    pub fn period_ms(self) -> u32 {
        match self {
            Self::Hz100 => 10,
            Self::Hz20 => 50,
            Self::Hz10 => 100,
            Self::Hz2 => 500,
        }
    }
}

/// Every id the ECUs put on the bus, with its rate class and a short name.
pub const KNOWN_MESSAGES: &[(u32, MessageClass, &str)] = &[
    (BRAKE_OUTPUT_IND_MSG, MessageClass::Hz100, "brake_output"),
    (ENGINE_RPM_MSG, MessageClass::Hz100, "engine_rpm"),
    (POWER_STEERING_OUT_IND_MSG, MessageClass::Hz100, "power_steering"),
    (SHIFT_POSITION_MSG, MessageClass::Hz100, "shift_position"),
    (BRAKE_OPERATION_MSG, MessageClass::Hz100, "brake_pedal"),
    (ACCELERATION_OPERATION_MSG, MessageClass::Hz100, "accelerator_pedal"),
    (STEERING_WHEEL_POS_MSG, MessageClass::Hz100, "steering_wheel"),
    (SHIFT_POSITION_SWITCH_MSG, MessageClass::Hz100, "shift_switch"),
    (ENGINE_START_MSG, MessageClass::Hz100, "engine_start"),
    (TURN_SWITCH_MSG, MessageClass::Hz100, "turn_switch"),
    (HORN_SWITCH_MSG, MessageClass::Hz100, "horn_switch"),
    (TURN_SIGNAL_INDICATOR_MSG, MessageClass::Hz100, "turn_indicator"),
    (ENGINE_STATUS_MSG, MessageClass::Hz20, "engine_status"),
    (PARKING_BRAKE_STATUS_MSG, MessageClass::Hz20, "parking_brake_status"),
    (LIGHT_SWITCH_MSG, MessageClass::Hz20, "light_switch"),
    (PARKING_BRAKE_MSG, MessageClass::Hz20, "parking_switch"),
    (WIPER_SWITCH_FRONT_MSG, MessageClass::Hz10, "wiper_front"),
    (WIPER_SWITCH_REAR_MSG, MessageClass::Hz10, "wiper_rear"),
    (DOOR_LOCK_UNLOCK_MSG, MessageClass::Hz10, "door_lock_cmd"),
    (L_WINDOW_SWITCH_MSG, MessageClass::Hz10, "l_window_switch"),
    (R_WINDOW_SWITCH_MSG, MessageClass::Hz10, "r_window_switch"),
    (L_DOOR_HANDLE_MSG, MessageClass::Hz10, "l_door_handle"),
    (R_DOOR_HANDLE_MSG, MessageClass::Hz10, "r_door_handle"),
    (DOOR_LOCK_STATUS_MSG, MessageClass::Hz10, "door_lock_status"),
    (L_DOOR_POSITION_MSG, MessageClass::Hz2, "l_door_position"),
    (R_DOOR_POSITION_MSG, MessageClass::Hz2, "r_door_position"),
];

/// Rate class of a known id.
pub fn message_class(id: u32) -> Option<MessageClass> {
    KNOWN_MESSAGES
        .iter()
        .find(|(known, _, _)| *known == id)
        .map(|(_, class, _)| *class)
}

/// Short name of a known id, for logs.
pub fn message_name(id: u32) -> Option<&'static str> {
    KNOWN_MESSAGES
        .iter()
        .find(|(known, _, _)| *known == id)
        .map(|(_, _, name)| *name)
}

/// Whether `id` fits the per-id tables.
pub fn is_valid_id(id: u32) -> bool {
    id <= MAX_CAN_ID
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn known_ids_are_unique_and_in_range() {
        let ids: HashSet<u32> = KNOWN_MESSAGES.iter().map(|(id, _, _)| *id).collect();
        assert_eq!(ids.len(), KNOWN_MESSAGES.len());
        assert!(ids.iter().all(|id| is_valid_id(*id) && *id != 0));
    }

    #[test]
    fn class_periods() {
        assert_eq!(message_class(ENGINE_RPM_MSG).unwrap().period_ms(), 10);
        assert_eq!(message_class(ENGINE_STATUS_MSG).unwrap().period_ms(), 50);
        assert_eq!(message_class(DOOR_LOCK_STATUS_MSG).unwrap().period_ms(), 100);
        assert_eq!(message_class(L_DOOR_POSITION_MSG).unwrap().period_ms(), 500);
        assert!(message_class(0x7DF).is_none());
    }

    #[test]
    fn names_for_logs() {
        assert_eq!(message_name(BRAKE_OUTPUT_IND_MSG), Some("brake_output"));
        assert_eq!(message_name(ENGINE_RPM_MSG), Some("engine_rpm"));
        assert!(message_name(0x7DF).is_none());
    }

    #[test]
    fn id_bounds() {
        assert!(is_valid_id(0xFFF));
        assert!(!is_valid_id(0x1000));
    }
}
