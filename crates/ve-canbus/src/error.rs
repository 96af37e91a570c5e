//! CAN bus error types.

use thiserror::Error;

/// Errors that can occur during CAN bus operations.
#[derive(Debug, Error)]
pub enum CanError {
    #[error("CAN interface error: {0}")]
    Interface(String),

    #[error("interface {interface} is not CAN FD capable (MTU {mtu})")]
    NotCanFd { interface: String, mtu: u32 },

    #[error("failed to bind CAN socket on {interface}: {reason}")]
    Bind { interface: String, reason: String },

    #[error("CAN write failed: {0}")]
    Write(String),

    #[error("CAN read failed: {0}")]
    Read(String),

    #[error("no frame within {timeout_us}us")]
    Timeout { timeout_us: u64 },

    #[error("payload of {len} bytes exceeds the 64 byte CAN FD limit")]
    OversizedPayload { len: usize },

    #[error("replayed frame rejected: sent {age_secs}s ago")]
    ReplayRejected { age_secs: i64 },

    #[error("frame authentication failed")]
    AuthenticationFailed,

    #[error("malformed envelope: {len} bytes, need {expected}")]
    Malformed { len: usize, expected: usize },

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("invalid encryption key: {0}")]
    InvalidKey(String),

    #[error("no payload layout for CAN id 0x{id:03X}")]
    UnknownMessage { id: u32 },

    #[error("CAN id 0x{id:X} is outside the supported range")]
    IdOutOfRange { id: u32 },

    #[error("{0}")]
    Other(String),
}

impl CanError {
    /// Whether the error only means "nothing usable arrived this poll".
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. }
                | Self::ReplayRejected { .. }
                | Self::AuthenticationFailed
                | Self::Malformed { .. }
                | Self::IdOutOfRange { .. }
        )
    }
}

/// Convenience alias for CAN bus results.
pub type CanResult<T> = Result<T, CanError>;
