//! GUI input line protocol.
//!
//! The GUI writes `EXD` lines of `<id:2 hex><value:1-8 hex>` pairs,
//! terminated by CR. Only the chassis node, which owns the driver controls,
//! applies them.

use ve_protocol::VehicleState;

/// Longest accepted input line; longer lines are discarded.
pub const MAX_LINE_LEN: usize = 512;

const CR: u8 = 0x0D;
const BACKSPACE: u8 = 0x08;
const DELETE: u8 = 0x7F;

/// Accumulates serial bytes into upper-cased command lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    line: String,
    overflowed: bool,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes, returning every line completed by them.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &b in bytes {
            match b {
                CR => {
                    let line = std::mem::take(&mut self.line);
                    if std::mem::take(&mut self.overflowed) {
                        tracing::warn!(max = MAX_LINE_LEN, "discarding overlong GUI line");
                    } else {
                        lines.push(line);
                    }
                }
                BACKSPACE | DELETE => {
                    self.line.pop();
                }
                _ if self.overflowed => {}
                _ => {
                    if self.line.len() >= MAX_LINE_LEN {
                        self.line.clear();
                        self.overflowed = true;
                    } else {
                        self.line.push(char::from(b.to_ascii_uppercase()));
                    }
                }
            }
        }
        lines
    }

    pub fn pending(&self) -> &str {
        &self.line
    }
}

/// Parse an `EXD` line into `(field id, value)` pairs.
///
/// Returns `None` for lines that are not `EXD` commands. A malformed id
/// stops parsing; pairs before it are still returned.
pub fn parse_exd(line: &str) -> Option<Vec<(u8, u32)>> {
    let line = line.strip_prefix('\n').unwrap_or(line);
    let body = line.strip_prefix("EXD")?.as_bytes();

    let mut pairs = Vec::new();
    let mut pos = 0;
    while pos < body.len() {
        while body.get(pos) == Some(&b' ') {
            pos += 1;
        }
        if pos >= body.len() {
            break;
        }

        let (id, id_digits) = hex_run(body, &mut pos, 2);
        if id_digits != 2 {
            tracing::warn!(line, "malformed GUI field id");
            break;
        }
        let (value, digits) = hex_run(body, &mut pos, 8);
        if digits > 0 {
            pairs.push((id as u8, value));
        }
    }
    Some(pairs)
}

/// Read up to `max` hex digits at `pos`, returning the value and digit count.
fn hex_run(bytes: &[u8], pos: &mut usize, max: usize) -> (u32, usize) {
    let mut value = 0u32;
    let mut digits = 0;
    while digits < max {
        let Some(d) = bytes.get(*pos).and_then(|b| char::from(*b).to_digit(16)) else {
            break;
        };
        value = (value << 4) | d;
        *pos += 1;
        digits += 1;
    }
    (value, digits)
}

/// Apply one GUI control to the chassis state. Returns `false` for unknown ids.
pub fn apply_gui_input(id: u8, value: u32, state: &mut VehicleState) -> bool {
    let byte = value as u8;
    match id {
        0x00 => state.brake_value = value as i32,
        0x01 => state.accelerator_value = value as i32,
        0x02 => state.steering_value = value as i32,
        0x03 => state.shift_value = byte,
        0x04 => state.turn_switch_value = byte,
        0x05 => state.horn_value = value != 0,
        0x06 => state.light_switch_value = byte,
        0x07 => state.light_flash_value = byte,
        0x08 => state.parking_value = value != 0,
        0x09 => state.wiper_f_sw_value = byte,
        0x0A => state.wiper_r_sw_value = byte,
        0x0B => state.door_lock_value = byte,
        0x0C => state.l_door_handle_value = byte,
        0x0D => state.r_door_handle_value = byte,
        0x0E => state.l_window_switch_value = byte,
        0x0F => state.r_window_switch_value = byte,
        0x10 => state.hazard_value = value != 0,
        0x11 => state.engine_value = value != 0,
        _ => {
            tracing::warn!(id = %format_args!("0x{id:02X}"), "unknown GUI field id");
            return false;
        }
    }
    true
}
