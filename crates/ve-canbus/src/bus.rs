//! Transport plus codec: the node's view of one CAN segment.

use std::sync::Arc;
use std::time::Duration;

use ve_protocol::{CanMessage, MAX_PAYLOAD};

use crate::codec::{FrameCodec, PLAINTEXT_LEN};
use crate::error::{CanError, CanResult};
use crate::interface::CanInterface;
use crate::types::CanFrame;

/// One CAN segment with the node's frame codec applied on both directions.
#[derive(Clone)]
pub struct SecureBus {
    name: String,
    interface: Arc<dyn CanInterface>,
    codec: Arc<FrameCodec>,
}

impl SecureBus {
    pub fn new(name: impl Into<String>, interface: Arc<dyn CanInterface>, codec: Arc<FrameCodec>) -> Self {
        Self {
            name: name.into(),
            interface,
            codec,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn codec(&self) -> &FrameCodec {
        &self.codec
    }

    /// Encode and transmit `msg` as one 64-byte CAN FD frame.
    pub async fn send(&self, msg: &CanMessage) -> CanResult<usize> {
        if usize::from(msg.length) > MAX_PAYLOAD {
            return Err(CanError::OversizedPayload {
                len: usize::from(msg.length),
            });
        }
        let wire = self.codec.encode(&msg.payload)?;
        let written = self
            .interface
            .send_frame(&CanFrame::new(msg.id, wire.to_vec()))
            .await?;
        tracing::trace!(
            bus = %self.name,
            id = %format_args!("0x{:03X}", msg.id),
            bytes = written,
            "frame sent"
        );
        Ok(written)
    }

    /// Receive and decode one frame, waiting at most `timeout`.
    ///
    /// Anything that does not yield a valid message (nothing pending, stale
    /// or forged frames, read errors) comes back as `None`.
    pub async fn poll(&self, timeout: Duration) -> Option<CanMessage> {
        let frame = match self.interface.recv_frame(timeout).await {
            Ok(frame) => frame,
            Err(CanError::Timeout { .. }) => return None,
            Err(e) => {
                tracing::warn!(bus = %self.name, error = %e, "CAN receive failed");
                return None;
            }
        };

        match self.codec.decode(&frame.data) {
            Ok(plaintext) => {
                let mut msg = CanMessage::new(frame.id, PLAINTEXT_LEN as u8);
                msg.payload[..PLAINTEXT_LEN].copy_from_slice(&plaintext);
                tracing::trace!(
                    bus = %self.name,
                    id = %format_args!("0x{:03X}", frame.id),
                    data = %frame.hex_data(),
                    "frame received"
                );
                Some(msg)
            }
            Err(e) => {
                tracing::warn!(
                    bus = %self.name,
                    id = %format_args!("0x{:03X}", frame.id),
                    error = %e,
                    "dropping frame"
                );
                None
            }
        }
    }
}

impl std::fmt::Debug for SecureBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureBus")
            .field("name", &self.name)
            .field("codec", &self.codec)
            .finish()
    }
}
