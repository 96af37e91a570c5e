//! Decoding received messages into the node's vehicle state.
//!
//! Each role listens to a fixed set of ids. The observer listens to all of
//! them. Handlers return `false` for ids the role does not understand.

use ve_protocol::ids::*;
use ve_protocol::{CanMessage, EcuRole, VehicleState};

/// Apply `msg` to `state` according to `role`.
///
/// `previous` is the snapshot taken at the end of the last main-loop
/// iteration; door-lock edge detection compares against it.
pub fn apply(
    role: EcuRole,
    msg: &CanMessage,
    state: &mut VehicleState,
    previous: &VehicleState,
) -> bool {
    match role {
        EcuRole::Powertrain => powertrain(msg, state),
        EcuRole::Chassis => chassis(msg, state, previous),
        EcuRole::Body => body(msg, state),
        EcuRole::Observer => {
            body(msg, state) || chassis(msg, state, previous) || powertrain(msg, state)
        }
        // The gateway relays frames and never decodes them.
        EcuRole::Gateway => false,
    }
}

fn u16_value(msg: &CanMessage, offset: usize) -> i32 {
    i32::from(msg.u16_be(offset))
}

/// Driver inputs consumed by the engine and brake model.
fn powertrain(msg: &CanMessage, state: &mut VehicleState) -> bool {
    match msg.id {
        BRAKE_OPERATION_MSG => state.brake_value = u16_value(msg, 0),
        ACCELERATION_OPERATION_MSG => state.accelerator_value = u16_value(msg, 0),
        STEERING_WHEEL_POS_MSG => state.steering_value = u16_value(msg, 0),
        SHIFT_POSITION_SWITCH_MSG => state.shift_value = msg.payload[0],
        ENGINE_START_MSG => state.engine_value = msg.payload[0] != 0,
        PARKING_BRAKE_MSG => state.parking_value = msg.payload[0] != 0,
        _ => return false,
    }
    true
}

/// Powertrain and body outputs shown on the dashboard.
fn chassis(msg: &CanMessage, state: &mut VehicleState, previous: &VehicleState) -> bool {
    match msg.id {
        BRAKE_OUTPUT_IND_MSG => state.brake_output = u16_value(msg, 0),
        ENGINE_RPM_MSG => {
            state.engine_rpm = u16_value(msg, 0);
            state.speed_kph = u16_value(msg, 2);
        }
        POWER_STEERING_OUT_IND_MSG => state.power_steering = u16_value(msg, 0),
        SHIFT_POSITION_MSG => state.shift_position = msg.payload[0],
        TURN_SIGNAL_INDICATOR_MSG => state.turn_signal_indicator = msg.payload[0],
        ENGINE_STATUS_MSG => state.engine_status = msg.payload[0] & 0x01,
        PARKING_BRAKE_STATUS_MSG => state.parking_brake_status = msg.payload[0] & 0x01,
        DOOR_LOCK_STATUS_MSG => {
            state.door_lock_status = msg.payload[0];
            release_door_lock_command(state, previous);
        }
        L_DOOR_POSITION_MSG => state.l_door_position = msg.payload[0],
        R_DOOR_POSITION_MSG => state.r_door_position = msg.payload[0],
        _ => return false,
    }
    true
}

/// Switch positions driving lights, wipers, doors and windows.
fn body(msg: &CanMessage, state: &mut VehicleState) -> bool {
    match msg.id {
        TURN_SWITCH_MSG => {
            state.turn_switch_value = msg.payload[0];
            state.hazard_value = msg.payload[1] != 0;
        }
        HORN_SWITCH_MSG => state.horn_value = msg.payload[0] & 0x01 != 0,
        BRAKE_OPERATION_MSG => state.brake_value = u16_value(msg, 0),
        LIGHT_SWITCH_MSG => state.light_switch_value = msg.payload[0] & 0x07,
        WIPER_SWITCH_FRONT_MSG => state.wiper_f_sw_value = msg.payload[0],
        WIPER_SWITCH_REAR_MSG => state.wiper_r_sw_value = msg.payload[0],
        DOOR_LOCK_UNLOCK_MSG => state.door_lock_value = msg.payload[0],
        L_DOOR_HANDLE_MSG => state.l_door_handle_value = msg.payload[0],
        R_DOOR_HANDLE_MSG => state.r_door_handle_value = msg.payload[0],
        L_WINDOW_SWITCH_MSG => state.l_window_switch_value = msg.payload[0],
        R_WINDOW_SWITCH_MSG => state.r_window_switch_value = msg.payload[0],
        _ => return false,
    }
    true
}

/// Clear the lock (bit 0) or unlock (bit 1) command once the body reports
/// that it acted on it.
///
/// Status bit 2 acknowledges a lock issued while bit 0 was set, bit 3 an
/// unlock issued while bit 1 was set.
fn release_door_lock_command(state: &mut VehicleState, previous: &VehicleState) {
    let new = state.door_lock_status;
    let old = previous.door_lock_status;
    if (new & 0x04) >> 2 & old & 0x01 != 0 {
        state.door_lock_value &= 0xfe;
    } else if (new & 0x08) >> 3 & (old & 0x02) >> 1 != 0 {
        state.door_lock_value &= 0xfd;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u16_msg(id: u32, value: u16) -> CanMessage {
        let mut msg = CanMessage::new(id, 16);
        msg.put_u16_be(0, value);
        msg
    }

    fn byte_msg(id: u32, b0: u8, b1: u8) -> CanMessage {
        CanMessage::with_data(id, &[b0, b1])
    }

    #[test]
    fn powertrain_reads_driver_inputs() {
        let mut state = VehicleState::default();
        let prev = state;
        assert!(apply(EcuRole::Powertrain, &u16_msg(BRAKE_OPERATION_MSG, 50), &mut state, &prev));
        assert!(apply(EcuRole::Powertrain, &u16_msg(STEERING_WHEEL_POS_MSG, 540), &mut state, &prev));
        assert!(apply(EcuRole::Powertrain, &byte_msg(SHIFT_POSITION_SWITCH_MSG, b'D', 0), &mut state, &prev));
        assert!(apply(EcuRole::Powertrain, &byte_msg(ENGINE_START_MSG, 1, 0), &mut state, &prev));
        assert_eq!(state.brake_value, 50);
        assert_eq!(state.steering_value, 540);
        assert_eq!(state.shift_value, b'D');
        assert!(state.engine_value);

        // Powertrain outputs are not its own inputs.
        assert!(!apply(EcuRole::Powertrain, &u16_msg(ENGINE_RPM_MSG, 9000), &mut state, &prev));
        assert_eq!(state.engine_rpm, 0);
    }

    #[test]
    fn chassis_reads_rpm_and_speed() {
        let mut state = VehicleState::default();
        let prev = state;
        let mut msg = CanMessage::new(ENGINE_RPM_MSG, 16);
        msg.put_u16_be(0, 5000);
        msg.put_u16_be(2, 60);
        assert!(apply(EcuRole::Chassis, &msg, &mut state, &prev));
        assert_eq!(state.engine_rpm, 5000);
        assert_eq!(state.speed_kph, 60);
    }

    #[test]
    fn status_flags_keep_bit_zero_only() {
        let mut state = VehicleState::default();
        let prev = state;
        apply(EcuRole::Chassis, &byte_msg(ENGINE_STATUS_MSG, 0xFF, 0), &mut state, &prev);
        apply(EcuRole::Chassis, &byte_msg(PARKING_BRAKE_STATUS_MSG, 0x02, 0), &mut state, &prev);
        assert_eq!(state.engine_status, 1);
        assert_eq!(state.parking_brake_status, 0);
    }

    #[test]
    fn body_reads_switches() {
        let mut state = VehicleState::default();
        let prev = state;
        apply(EcuRole::Body, &byte_msg(TURN_SWITCH_MSG, 2, 1), &mut state, &prev);
        apply(EcuRole::Body, &byte_msg(HORN_SWITCH_MSG, 0x03, 0), &mut state, &prev);
        apply(EcuRole::Body, &byte_msg(LIGHT_SWITCH_MSG, 0xFA, 0), &mut state, &prev);
        apply(EcuRole::Body, &byte_msg(DOOR_LOCK_UNLOCK_MSG, 1, 0), &mut state, &prev);
        assert_eq!(state.turn_switch_value, 2);
        assert!(state.hazard_value);
        assert!(state.horn_value);
        assert_eq!(state.light_switch_value, 0x02);
        assert_eq!(state.door_lock_value, 1);
    }

    #[test]
    fn gateway_never_decodes() {
        let mut state = VehicleState::default();
        let prev = state;
        assert!(!apply(EcuRole::Gateway, &u16_msg(BRAKE_OPERATION_MSG, 50), &mut state, &prev));
        assert_eq!(state, prev);
    }

    #[test]
    fn observer_understands_every_known_id() {
        for (id, _, name) in KNOWN_MESSAGES {
            let mut state = VehicleState::default();
            let prev = state;
            assert!(
                apply(EcuRole::Observer, &byte_msg(*id, 0, 0), &mut state, &prev),
                "observer ignored {name}"
            );
        }
        let mut state = VehicleState::default();
        let prev = state;
        assert!(!apply(EcuRole::Observer, &byte_msg(0x7DF, 0, 0), &mut state, &prev));
    }

    #[test]
    fn lock_acknowledge_clears_lock_command() {
        let mut state = VehicleState {
            door_lock_value: 0x01,
            ..Default::default()
        };
        let prev = VehicleState {
            door_lock_status: 0x01,
            ..Default::default()
        };
        apply(EcuRole::Chassis, &byte_msg(DOOR_LOCK_STATUS_MSG, 0x04, 0), &mut state, &prev);
        assert_eq!(state.door_lock_value, 0x00);
        assert_eq!(state.door_lock_status, 0x04);
    }

    #[test]
    fn unlock_acknowledge_clears_unlock_command() {
        let mut state = VehicleState {
            door_lock_value: 0x02,
            ..Default::default()
        };
        let prev = VehicleState {
            door_lock_status: 0x02,
            ..Default::default()
        };
        apply(EcuRole::Chassis, &byte_msg(DOOR_LOCK_STATUS_MSG, 0x08, 0), &mut state, &prev);
        assert_eq!(state.door_lock_value, 0x00);
    }

    #[test]
    fn acknowledge_without_matching_previous_state_is_ignored() {
        let mut state = VehicleState {
            door_lock_value: 0x03,
            ..Default::default()
        };
        let prev = VehicleState::default();
        apply(EcuRole::Chassis, &byte_msg(DOOR_LOCK_STATUS_MSG, 0x0C, 0), &mut state, &prev);
        assert_eq!(state.door_lock_value, 0x03);
    }

    #[test]
    fn repeated_status_is_idempotent() {
        let prev = VehicleState {
            door_lock_status: 0x01,
            ..Default::default()
        };
        let mut state = VehicleState {
            door_lock_value: 0x03,
            ..Default::default()
        };
        let msg = byte_msg(DOOR_LOCK_STATUS_MSG, 0x04, 0);
        apply(EcuRole::Chassis, &msg, &mut state, &prev);
        let once = state;
        apply(EcuRole::Chassis, &msg, &mut state, &prev);
        assert_eq!(state, once);
        assert_eq!(state.door_lock_value, 0x02);
    }
}
