//! Payload layouts for every periodic message.
//!
//! Multi-byte values are big-endian u16; single values sit in byte 0.

use ve_protocol::ids::*;
use ve_protocol::{CanMessage, MessageDefinition, VehicleState};

use crate::error::{CanError, CanResult};

/// Serialize the state fields carried by `def.id` into an outbound message.
pub fn format_message(def: &MessageDefinition, state: &VehicleState) -> CanResult<CanMessage> {
    let mut msg = CanMessage::new(def.id, def.dlc);

    match def.id {
        BRAKE_OUTPUT_IND_MSG => msg.put_u16_be(0, state.brake_output as u16),
        ENGINE_RPM_MSG => {
            msg.put_u16_be(0, state.engine_rpm as u16);
            msg.put_u16_be(2, state.speed_kph as u16);
        }
        POWER_STEERING_OUT_IND_MSG => msg.put_u16_be(0, state.power_steering as u16),
        SHIFT_POSITION_MSG => msg.payload[0] = state.shift_position,
        BRAKE_OPERATION_MSG => msg.put_u16_be(0, state.brake_value as u16),
        ACCELERATION_OPERATION_MSG => msg.put_u16_be(0, state.accelerator_value as u16),
        STEERING_WHEEL_POS_MSG => msg.put_u16_be(0, state.steering_value as u16),
        SHIFT_POSITION_SWITCH_MSG => msg.payload[0] = state.shift_value,
        ENGINE_START_MSG => msg.payload[0] = u8::from(state.engine_value),
        TURN_SWITCH_MSG => {
            msg.payload[0] = state.turn_switch_value;
            msg.payload[1] = u8::from(state.hazard_value);
        }
        HORN_SWITCH_MSG => msg.payload[0] = u8::from(state.horn_value),
        TURN_SIGNAL_INDICATOR_MSG => msg.payload[0] = state.turn_signal_indicator,
        ENGINE_STATUS_MSG => msg.payload[0] = state.engine_status,
        PARKING_BRAKE_STATUS_MSG => msg.payload[0] = state.parking_brake_status,
        LIGHT_SWITCH_MSG => msg.payload[0] = state.light_switch_value,
        PARKING_BRAKE_MSG => msg.payload[0] = u8::from(state.parking_value),
        WIPER_SWITCH_FRONT_MSG => msg.payload[0] = state.wiper_f_sw_value,
        WIPER_SWITCH_REAR_MSG => msg.payload[0] = state.wiper_r_sw_value,
        DOOR_LOCK_UNLOCK_MSG => msg.payload[0] = state.door_lock_value,
        L_DOOR_HANDLE_MSG => msg.payload[0] = state.l_door_handle_value,
        R_DOOR_HANDLE_MSG => msg.payload[0] = state.r_door_handle_value,
        L_WINDOW_SWITCH_MSG => msg.payload[0] = state.l_window_switch_value,
        R_WINDOW_SWITCH_MSG => msg.payload[0] = state.r_window_switch_value,
        DOOR_LOCK_STATUS_MSG => msg.payload[0] = state.door_lock_status,
        L_DOOR_POSITION_MSG => msg.payload[0] = state.l_door_position,
        R_DOOR_POSITION_MSG => msg.payload[0] = state.r_door_position,
        id => return Err(CanError::UnknownMessage { id }),
    }

    Ok(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(id: u32) -> MessageDefinition {
        MessageDefinition::new(id, 8, true, 10)
    }

    #[test]
    fn rpm_and_speed_are_big_endian_pairs() {
        let state = VehicleState {
            engine_rpm: 5000,
            speed_kph: 60,
            ..Default::default()
        };
        let msg = format_message(&def(ENGINE_RPM_MSG), &state).unwrap();
        assert_eq!(&msg.payload[..4], &[0x13, 0x88, 0x00, 0x3C]);
        assert_eq!(msg.length, 8);
    }

    #[test]
    fn brake_pedal_layout() {
        let state = VehicleState {
            brake_value: 50,
            ..Default::default()
        };
        let msg = format_message(&def(BRAKE_OPERATION_MSG), &state).unwrap();
        assert_eq!(msg.u16_be(0), 50);
    }

    #[test]
    fn turn_switch_carries_hazard() {
        let state = VehicleState {
            turn_switch_value: 2,
            hazard_value: true,
            ..Default::default()
        };
        let msg = format_message(&def(TURN_SWITCH_MSG), &state).unwrap();
        assert_eq!(&msg.payload[..2], &[2, 1]);
    }

    #[test]
    fn single_byte_fields() {
        let state = VehicleState {
            shift_position: b'D',
            door_lock_status: 0x05,
            r_door_position: 1,
            ..Default::default()
        };
        assert_eq!(format_message(&def(SHIFT_POSITION_MSG), &state).unwrap().payload[0], b'D');
        assert_eq!(format_message(&def(DOOR_LOCK_STATUS_MSG), &state).unwrap().payload[0], 0x05);
        assert_eq!(format_message(&def(R_DOOR_POSITION_MSG), &state).unwrap().payload[0], 1);
    }

    #[test]
    fn every_known_id_has_a_layout() {
        let state = VehicleState::default();
        for (id, _, name) in KNOWN_MESSAGES {
            assert!(format_message(&def(*id), &state).is_ok(), "{name} has no layout");
        }
    }

    #[test]
    fn unknown_id_is_an_error() {
        let err = format_message(&def(0x7DF), &VehicleState::default()).unwrap_err();
        assert!(matches!(err, CanError::UnknownMessage { id: 0x7DF }));
    }
}
