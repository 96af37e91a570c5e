//! Simple per-role vehicle model, stepped once per main-loop iteration.

use ve_protocol::{EcuRole, VehicleState};

/// The engine model integrates only every this many iterations.
pub const SIMULATION_DIVIDER: u32 = 20;

const RPM_MAX: i32 = 65_535;
const UPSHIFT_RPM: i32 = 60_000;
const DOWNSHIFT_RPM: i32 = 5_000;
const RPM_AFTER_UPSHIFT: i32 = 5_000;
const RPM_AFTER_DOWNSHIFT: i32 = 50_000;
const RPM_DECAY: i32 = 100;
const TOP_GEAR: i32 = 6;
const SPEED_MAX: i32 = 255;

#[derive(Debug, Clone, Default)]
pub struct Dynamics {
    ticks_till_simulation: u32,
}

impl Dynamics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the role's computed outputs from its inputs.
    pub fn step(&mut self, role: EcuRole, state: &mut VehicleState) {
        match role {
            EcuRole::Powertrain => self.powertrain(state),
            EcuRole::Chassis => chassis(state),
            EcuRole::Body => body(state),
            EcuRole::Gateway | EcuRole::Observer => {}
        }
    }

    fn powertrain(&mut self, state: &mut VehicleState) {
        state.parking_brake_status = u8::from(state.parking_value);
        state.shift_position = state.shift_value;

        // The engine only starts in park.
        if state.shift_position == b'P' && state.engine_value {
            state.engine_status = 1;
        }
        if !state.engine_value {
            state.engine_status = 0;
        }

        if self.ticks_till_simulation == 0 {
            self.ticks_till_simulation = SIMULATION_DIVIDER;
            integrate_engine(state);
        }
        self.ticks_till_simulation -= 1;

        // 0..720 degrees at the wheel map to ±30 degrees at the tyres, offset by 360.
        state.power_steering = (state.steering_value - 360) * 30 / 360 + 360;
    }
}

fn integrate_engine(state: &mut VehicleState) {
    let in_gear = matches!(state.shift_position, b'D' | b'N' | b'R');
    let drive = state.shift_position == b'D';

    if state.accelerator_value > 0 && state.engine_status != 0 && in_gear {
        state.engine_rpm += state.accelerator_value;
        if drive && state.gear < TOP_GEAR && state.engine_rpm > UPSHIFT_RPM {
            state.gear += 1;
            state.engine_rpm = RPM_AFTER_UPSHIFT;
        }
        state.engine_rpm = state.engine_rpm.min(RPM_MAX);
    } else {
        state.engine_rpm -= RPM_DECAY;
        if drive && state.gear > 1 && state.engine_rpm < DOWNSHIFT_RPM {
            state.gear -= 1;
            state.engine_rpm = RPM_AFTER_DOWNSHIFT;
        }
        state.engine_rpm = state.engine_rpm.max(0);
    }
    if state.shift_position == b'R' {
        state.gear = 1;
    }

    if state.brake_value > 0 {
        state.brake_output = (state.brake_output + state.brake_value).min(RPM_MAX);
    } else {
        state.brake_output = 0;
    }

    let mut target = (state.engine_rpm + (state.gear - 1) * RPM_MAX) / 1542;
    target -= state.brake_output * 100 / RPM_MAX;
    target -= i32::from(state.parking_brake_status) * 40;
    // Without throttle the car can only slow down.
    if state.accelerator_value == 0 && target > state.speed_kph {
        target = state.speed_kph;
    }

    let delta = target - state.speed_kph;
    state.speed_kph += (delta + 1).div_euclid(2);
    state.speed_kph = state.speed_kph.clamp(0, SPEED_MAX);
}

fn chassis(state: &mut VehicleState) {
    state.door_open_indicator = state.l_door_position | state.r_door_position;
    state.door_lock_indicator = state.door_lock_status;
}

fn body(state: &mut VehicleState) {
    state.turn_signal_indicator = if state.hazard_value {
        3
    } else {
        state.turn_switch_value
    };
    state.front_wiper_status = state.wiper_f_sw_value;
    state.rear_wiper_status = state.wiper_r_sw_value;
    state.horn_operation = u8::from(state.horn_value);
    state.light_status = state.light_switch_value;

    // Handle 2 closes a door, handle 1 opens it when unlocked.
    if state.l_door_handle_value == 2 {
        state.l_door_position = 0;
    } else if state.l_door_handle_value == 1 && state.door_lock_status == 0 {
        state.l_door_position = 1;
    }
    if state.r_door_handle_value == 2 {
        state.r_door_position = 0;
    } else if state.r_door_handle_value == 1 && state.door_lock_status == 0 {
        state.r_door_position = 1;
    }

    // Switch 1 raises a window, 2 lowers it.
    match state.l_window_switch_value {
        1 => state.l_window_position = 0,
        2 => state.l_window_position = 1,
        _ => {}
    }
    match state.r_window_switch_value {
        1 => state.r_window_position = 0,
        2 => state.r_window_position = 1,
        _ => {}
    }

    let doors_closed = state.l_door_position == 0 && state.r_door_position == 0;
    if state.door_lock_value == 1 && state.door_lock_status != 1 && doors_closed {
        state.door_lock_status = 1;
    }
    if state.door_lock_value == 2 {
        state.door_lock_status = 0;
    }
}
