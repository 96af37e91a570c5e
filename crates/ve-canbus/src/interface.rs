//! CAN bus interface abstraction.
//!
//! `CanInterface` trait with `send_frame`/`recv_frame`. Implementations:
//! - `SocketCanInterface`: Linux-only, wraps `socketcan::CanFdSocket`
//! - `MockCanInterface` / `VirtualCanBus` ports: all platforms (in `mock.rs`)

use async_trait::async_trait;
use std::time::Duration;

use crate::error::CanResult;
use crate::types::CanFrame;

/// Trait for CAN bus interface implementations.
#[async_trait]
pub trait CanInterface: Send + Sync {
    /// Send one CAN FD frame, returning the number of data bytes written.
    async fn send_frame(&self, frame: &CanFrame) -> CanResult<usize>;

    /// Receive a CAN frame, waiting up to `timeout`.
    ///
    /// `Err(CanError::Timeout)` means nothing arrived and is not a failure.
    async fn recv_frame(&self, timeout: Duration) -> CanResult<CanFrame>;
}

// ── SocketCAN (Linux-only) ──────────────────────────────────────

#[cfg(target_os = "linux")]
pub use linux::SocketCanInterface;

#[cfg(target_os = "linux")]
mod linux {
    use std::io;
    use std::time::Duration;

    use async_trait::async_trait;
    use socketcan::{
        CanAnyFrame, CanFdFrame, CanFdSocket, EmbeddedFrame, ExtendedId, Id, Socket,
        StandardId,
    };

    use super::CanInterface;
    use crate::error::{CanError, CanResult};
    use crate::types::{CANFD_MTU, CanFrame, DEFAULT_POLL_TIMEOUT};

    /// Raw CAN FD socket bound to one netdevice.
    ///
    /// Reads block for at most the configured poll timeout, so the node loop
    /// can call straight into the socket without parking a runtime worker for
    /// long.
    pub struct SocketCanInterface {
        socket: CanFdSocket,
        read_timeout: Duration,
    }

    impl SocketCanInterface {
        /// Bind to `interface_name` with the default 100us read timeout.
        pub fn bind(interface_name: &str) -> CanResult<Self> {
            Self::bind_with_timeout(interface_name, DEFAULT_POLL_TIMEOUT)
        }

        pub fn bind_with_timeout(interface_name: &str, read_timeout: Duration) -> CanResult<Self> {
            let mtu = read_mtu(interface_name)?;
            if mtu != CANFD_MTU {
                return Err(CanError::NotCanFd {
                    interface: interface_name.to_string(),
                    mtu,
                });
            }

            let socket = CanFdSocket::open(interface_name).map_err(|e| CanError::Bind {
                interface: interface_name.to_string(),
                reason: e.to_string(),
            })?;
            socket
                .set_read_timeout(read_timeout)
                .map_err(|e| CanError::Bind {
                    interface: interface_name.to_string(),
                    reason: format!("set read timeout: {e}"),
                })?;

            tracing::info!(interface = interface_name, mtu, "CAN FD socket bound");

            Ok(Self {
                socket,
                read_timeout,
            })
        }
    }

    fn read_mtu(interface_name: &str) -> CanResult<u32> {
        let path = format!("/sys/class/net/{interface_name}/mtu");
        let raw = std::fs::read_to_string(&path).map_err(|e| CanError::Bind {
            interface: interface_name.to_string(),
            reason: format!("{path}: {e}"),
        })?;
        raw.trim().parse::<u32>().map_err(|e| CanError::Bind {
            interface: interface_name.to_string(),
            reason: format!("unparseable MTU '{}': {e}", raw.trim()),
        })
    }

    fn to_id(raw: u32) -> Option<Id> {
        if raw <= u32::from(StandardId::MAX.as_raw()) {
            StandardId::new(raw as u16).map(Id::Standard)
        } else {
            ExtendedId::new(raw).map(Id::Extended)
        }
    }

    fn raw_id(id: Id) -> u32 {
        match id {
            Id::Standard(id) => u32::from(id.as_raw()),
            Id::Extended(id) => id.as_raw(),
        }
    }

    #[async_trait]
    impl CanInterface for SocketCanInterface {
        async fn send_frame(&self, frame: &CanFrame) -> CanResult<usize> {
            let id = to_id(frame.id).ok_or(CanError::IdOutOfRange { id: frame.id })?;
            let fd_frame = CanFdFrame::new(id, &frame.data)
                .ok_or_else(|| CanError::OversizedPayload { len: frame.data.len() })?;
            self.socket
                .write_frame(&fd_frame)
                .map_err(|e| CanError::Write(e.to_string()))?;
            Ok(frame.data.len())
        }

        async fn recv_frame(&self, _timeout: Duration) -> CanResult<CanFrame> {
            match self.socket.read_frame() {
                Ok(CanAnyFrame::Fd(f)) => Ok(CanFrame::new(raw_id(f.id()), f.data().to_vec())),
                Ok(CanAnyFrame::Normal(f)) => {
                    Ok(CanFrame::new(raw_id(f.id()), f.data().to_vec()))
                }
                Ok(_) => Err(CanError::Timeout {
                    timeout_us: self.read_timeout.as_micros() as u64,
                }),
                Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                    Err(CanError::Timeout {
                        timeout_us: self.read_timeout.as_micros() as u64,
                    })
                }
                Err(e) => Err(CanError::Read(e.to_string())),
            }
        }
    }

}
