//! Plausibility ranges the observer enforces on decoded state.

use ve_protocol::{Field, VehicleState};

fn within(value: i32, min: i32, max: i32) -> bool {
    (min..=max).contains(&value)
}

fn gear_char(value: u8) -> bool {
    matches!(value, b'P' | b'N' | b'R' | b'D')
}

/// First field whose value is out of range, if any.
///
/// Boolean fields cannot hold an illegal value and are not listed.
pub fn check_values(s: &VehicleState) -> Option<Field> {
    let checks: [(bool, Field); 33] = [
        (within(s.accelerator_value, 0, 100), Field::AcceleratorValue),
        (within(s.brake_output, 0, 65_535), Field::BrakeOutput),
        (within(s.brake_value, 0, 100), Field::BrakeValue),
        (s.door_lock_indicator <= 1, Field::DoorLockIndicator),
        (s.door_lock_status <= 1, Field::DoorLockStatus),
        (s.door_open_indicator <= 1, Field::DoorOpenIndicator),
        (within(s.engine_rpm, 0, 65_535), Field::EngineRpm),
        (s.engine_status <= 1, Field::EngineStatus),
        (s.front_wiper_status <= 1, Field::FrontWiperStatus),
        (within(s.gear, 0, 6), Field::Gear),
        (s.horn_operation <= 1, Field::HornOperation),
        (s.l_door_handle_value <= 2, Field::LDoorHandleValue),
        (s.l_door_position <= 1, Field::LDoorPosition),
        (s.l_window_position <= 1, Field::LWindowPosition),
        (s.l_window_switch_value <= 2, Field::LWindowSwitchValue),
        (s.light_flash_value <= 1, Field::LightFlashValue),
        (s.light_status <= 2, Field::LightStatus),
        (s.light_switch_value <= 2, Field::LightSwitchValue),
        (s.parking_brake_status <= 1, Field::ParkingBrakeStatus),
        (within(s.power_steering, 330, 390), Field::PowerSteering),
        (s.r_door_handle_value <= 2, Field::RDoorHandleValue),
        (s.r_door_position <= 1, Field::RDoorPosition),
        (s.r_window_position <= 1, Field::RWindowPosition),
        (s.r_window_switch_value <= 2, Field::RWindowSwitchValue),
        (s.rear_wiper_status <= 1, Field::RearWiperStatus),
        (gear_char(s.shift_position), Field::ShiftPosition),
        (gear_char(s.shift_value), Field::ShiftValue),
        (within(s.speed_kph, 0, 255), Field::SpeedKph),
        (within(s.steering_value, 0, 720), Field::SteeringValue),
        (s.turn_signal_indicator <= 3, Field::TurnSignalIndicator),
        (s.turn_switch_value <= 3, Field::TurnSwitchValue),
        (s.wiper_f_sw_value <= 1, Field::WiperFSwValue),
        (s.wiper_r_sw_value <= 1, Field::WiperRSwValue),
    ];

    checks
        .into_iter()
        .find(|(ok, _)| !ok)
        .map(|(_, field)| field)
}
