use serde::{Deserialize, Serialize};

use crate::diagnostic::{Diagnostic, RelayOutcome};

/// Every sensor, actuator and indicator value known to an ECU.
///
/// One live instance exists per node; the main loop keeps a copy of the
/// previous iteration to detect changed fields and door-lock transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VehicleState {
    // Driver inputs (chassis)
    pub engine_rpm: i32,
    pub speed_kph: i32,
    pub brake_value: i32,
    pub accelerator_value: i32,
    pub steering_value: i32,
    pub shift_value: u8,
    pub engine_value: bool,
    pub turn_switch_value: u8,
    pub hazard_value: bool,
    pub horn_value: bool,
    pub light_switch_value: u8,
    pub light_flash_value: u8,
    pub parking_value: bool,
    pub wiper_f_sw_value: u8,
    pub wiper_r_sw_value: u8,
    pub door_lock_value: u8,
    pub l_window_switch_value: u8,
    pub r_window_switch_value: u8,

    // Computed outputs (powertrain / body)
    pub brake_output: i32,
    pub power_steering: i32,
    pub gear: i32,
    pub shift_position: u8,
    pub turn_signal_indicator: u8,
    pub door_open_indicator: u8,
    pub door_lock_indicator: u8,
    pub horn_operation: u8,
    pub engine_status: u8,
    pub parking_brake_status: u8,
    pub light_status: u8,
    pub front_wiper_status: u8,
    pub rear_wiper_status: u8,
    pub door_lock_status: u8,
    pub l_door_handle_value: u8,
    pub r_door_handle_value: u8,
    pub l_door_position: u8,
    pub r_door_position: u8,
    pub l_window_position: u8,
    pub r_window_position: u8,

    /// Last observer verdict.
    pub observer: Diagnostic,
    /// Last gateway relay verdict.
    pub gateway: RelayOutcome,
}
