//! Node-level error types and their process exit codes.

use thiserror::Error;
use ve_canbus::CanError;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to open serial port {path}: {source}")]
    Serial {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Can(#[from] CanError),

    #[error("failed to build async runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

impl NodeError {
    /// Process exit code for a fatal startup error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Serial { .. } => 3,
            Self::Can(CanError::NotCanFd { .. }) => 5,
            Self::Can(CanError::InvalidKey(_)) => 6,
            Self::Can(_) => 4,
            Self::Runtime(_) => 7,
        }
    }
}

pub type NodeResult<T> = Result<T, NodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        assert_eq!(NodeError::Config("bad".into()).exit_code(), 2);
        assert_eq!(
            NodeError::Serial {
                path: "/dev/pts/1".into(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            }
            .exit_code(),
            3
        );
        assert_eq!(
            NodeError::from(CanError::Bind {
                interface: "vcan0".into(),
                reason: "no such device".into(),
            })
            .exit_code(),
            4
        );
        assert_eq!(
            NodeError::from(CanError::NotCanFd {
                interface: "vcan0".into(),
                mtu: 16,
            })
            .exit_code(),
            5
        );
        assert_eq!(NodeError::from(CanError::InvalidKey("short".into())).exit_code(), 6);
        assert_eq!(
            NodeError::Runtime(std::io::Error::other("no threads")).exit_code(),
            7
        );
    }
}
