//! `EXU` telemetry lines for the GUI.
//!
//! Each role reports a fixed table of fields. A line carries only the fields
//! that changed since the previous main-loop iteration, unless the GUI has
//! heard nothing for the refresh interval, in which case every field is sent.

use std::fmt::Write as _;

use ve_protocol::{EcuRole, VehicleState};

/// One reported field: table number, current value, whether it changed.
type Entry = (u8, u32, bool);

fn entry<T: PartialEq + Copy + Into<i64>>(nn: u8, now: T, before: T) -> Entry {
    (nn, now.into() as u32, now != before)
}

fn fields(role: EcuRole, s: &VehicleState, p: &VehicleState) -> Vec<Entry> {
    match role {
        EcuRole::Powertrain => vec![
            entry(0, s.shift_position, p.shift_position),
            entry(1, s.engine_status, p.engine_status),
            entry(2, s.brake_output, p.brake_output),
            entry(3, s.parking_brake_status, p.parking_brake_status),
            entry(4, s.gear, p.gear),
            entry(5, s.power_steering, p.power_steering),
        ],
        EcuRole::Chassis => vec![
            entry(0, s.engine_rpm, p.engine_rpm),
            entry(1, s.shift_position, p.shift_position),
            entry(2, s.engine_status, p.engine_status),
            entry(3, s.parking_brake_status, p.parking_brake_status),
            entry(4, s.turn_signal_indicator, p.turn_signal_indicator),
            entry(5, s.door_open_indicator, p.door_open_indicator),
            entry(6, s.door_lock_indicator, p.door_lock_indicator),
            entry(7, s.speed_kph, p.speed_kph),
        ],
        EcuRole::Body => vec![
            entry(0, s.horn_operation, p.horn_operation),
            entry(1, s.light_status, p.light_status),
            entry(2, s.turn_signal_indicator, p.turn_signal_indicator),
            entry(3, s.front_wiper_status, p.front_wiper_status),
            entry(4, s.rear_wiper_status, p.rear_wiper_status),
            entry(5, s.door_lock_status, p.door_lock_status),
            entry(6, s.l_door_position, p.l_door_position),
            entry(7, s.r_door_position, p.r_door_position),
            entry(8, s.l_window_position, p.l_window_position),
            entry(9, s.r_window_position, p.r_window_position),
        ],
        EcuRole::Gateway => vec![
            entry(0, s.gateway.id, p.gateway.id),
            entry(1, s.gateway.code.code(), p.gateway.code.code()),
        ],
        EcuRole::Observer => vec![
            entry(0, s.observer.target(), p.observer.target()),
            entry(1, s.observer.code(), p.observer.code()),
        ],
    }
}

#[derive(Debug)]
pub struct TelemetryWriter {
    role: EcuRole,
    refresh_ms: u64,
    last_line_ms: u64,
    send_all: bool,
}

impl TelemetryWriter {
    /// The first rendered line always carries every field.
    pub fn new(role: EcuRole, refresh_ms: u64) -> Self {
        Self {
            role,
            refresh_ms,
            last_line_ms: 0,
            send_all: true,
        }
    }

    /// Request a full line once the GUI has been idle for the refresh interval.
    pub fn refresh(&mut self, now_ms: u64) {
        if now_ms.saturating_sub(self.last_line_ms) > self.refresh_ms {
            self.send_all = true;
        }
    }

    /// Build the next line, or `None` when nothing needs reporting.
    pub fn render(&mut self, now_ms: u64, state: &VehicleState, previous: &VehicleState) -> Option<String> {
        let mut line = String::from("EXU");
        let mut any = false;
        for (nn, value, changed) in fields(self.role, state, previous) {
            if self.send_all || changed {
                let _ = write!(line, " {nn:02}{value:x}");
                any = true;
            }
        }
        if !any {
            return None;
        }

        line.push('\n');
        self.last_line_ms = now_ms;
        self.send_all = false;
        Some(line)
    }
}
