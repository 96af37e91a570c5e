//! Runtime diagnostics reported by the observer and the gateway.

use serde::{Deserialize, Serialize};

/// Vehicle state field referenced by a value diagnostic.
///
/// Discriminants are the field numbers shown in GUI telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Field {
    None = 0,
    EngineRpm,
    SpeedKph,
    BrakeValue,
    AcceleratorValue,
    SteeringValue,
    ShiftValue,
    EngineValue,
    TurnSwitchValue,
    HazardValue,
    HornValue,
    LightSwitchValue,
    LightFlashValue,
    ParkingValue,
    WiperFSwValue,
    WiperRSwValue,
    DoorLockValue,
    LWindowSwitchValue,
    RWindowSwitchValue,
    BrakeOutput,
    PowerSteering,
    Gear,
    ShiftPosition,
    TurnSignalIndicator,
    DoorOpenIndicator,
    DoorLockIndicator,
    HornOperation,
    EngineStatus,
    ParkingBrakeStatus,
    LightStatus,
    FrontWiperStatus,
    RearWiperStatus,
    DoorLockStatus,
    LDoorHandleValue,
    RDoorHandleValue,
    LDoorPosition,
    RDoorPosition,
    LWindowPosition,
    RWindowPosition,
}

impl Field {
    pub fn number(self) -> u32 {
        self as u32
    }
}

/// Observer verdict for the most recent anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum Diagnostic {
    #[default]
    Ok,
    /// A state field holds a value outside its legal range.
    BadValue(Field),
    /// A message arrived off its reference period.
    BadTiming(u32),
    /// A message id no ECU is supposed to send.
    BadCanId(u32),
}

impl Diagnostic {
    /// Numeric code used in telemetry.
    pub fn code(&self) -> u8 {
        match self {
            Self::Ok => 0,
            Self::BadValue(_) => 1,
            Self::BadTiming(_) => 2,
            Self::BadCanId(_) => 3,
        }
    }

    /// Field number or CAN id the diagnostic points at (0 when OK).
    pub fn target(&self) -> u32 {
        match self {
            Self::Ok => Field::None.number(),
            Self::BadValue(field) => field.number(),
            Self::BadTiming(id) | Self::BadCanId(id) => *id,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Gateway decision for the last relayed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum GatewayCode {
    #[default]
    Ok = 0,
    /// Inner → outer denied by the read allow-list.
    ReadBlocked = 1,
    /// Outer → inner denied by the write allow-list.
    WriteBlocked = 2,
}

impl GatewayCode {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Id and verdict of the last frame the gateway handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RelayOutcome {
    pub id: u32,
    pub code: GatewayCode,
}

impl RelayOutcome {
    pub fn new(id: u32, code: GatewayCode) -> Self {
        Self { id, code }
    }
}
