use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The ECU behaviour a node runs for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EcuRole {
    Powertrain,
    Chassis,
    Body,
    Gateway,
    Observer,
}

impl EcuRole {
    pub const ALL: [EcuRole; 5] = [
        Self::Powertrain,
        Self::Chassis,
        Self::Body,
        Self::Gateway,
        Self::Observer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Powertrain => "powertrain",
            Self::Chassis => "chassis",
            Self::Body => "body",
            Self::Gateway => "gateway",
            Self::Observer => "observer",
        }
    }

    /// Whether the role transmits periodic messages.
    pub fn sends_periodic(self) -> bool {
        !matches!(self, Self::Gateway | Self::Observer)
    }
}

impl std::fmt::Display for EcuRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown ECU role '{0}', expected one of: powertrain, chassis, body, gateway, observer")]
pub struct ParseRoleError(pub String);

impl std::str::FromStr for EcuRole {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseRoleError(s.to_string()))
    }
}
