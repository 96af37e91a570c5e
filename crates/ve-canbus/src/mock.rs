//! In-memory CAN interfaces for testing.
//!
//! `MockCanInterface` replays scripted frames and records what was sent.
//! `VirtualCanBus` joins any number of ports so several nodes can talk to
//! each other inside one test process, the way `vcan` does on a host.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::{CanError, CanResult};
use crate::interface::CanInterface;
use crate::types::CanFrame;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn timeout_error(timeout: Duration) -> CanError {
    CanError::Timeout {
        timeout_us: timeout.as_micros() as u64,
    }
}

// ── Mock interface ──────────────────────────────────────────────

/// Mock CAN interface with scripted responses and frame recording.
pub struct MockCanInterface {
    /// Queued frames returned by `recv_frame` (FIFO order).
    responses: Mutex<VecDeque<CanFrame>>,
    /// All frames passed to `send_frame` (for test assertions).
    sent_frames: Mutex<Vec<CanFrame>>,
    /// When set, every `send_frame` fails with a write error.
    fail_sends: bool,
}

impl MockCanInterface {
    /// Create a new mock with no queued responses.
    pub fn new() -> Self {
        Self::with_responses(Vec::new())
    }

    /// Create a mock pre-loaded with response frames.
    pub fn with_responses(responses: Vec<CanFrame>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            sent_frames: Mutex::new(Vec::new()),
            fail_sends: false,
        }
    }

    /// A mock whose transmit path is broken.
    pub fn failing() -> Self {
        Self {
            fail_sends: true,
            ..Self::new()
        }
    }

    /// Queue an additional response frame.
    pub fn queue_response(&self, frame: CanFrame) {
        lock(&self.responses).push_back(frame);
    }

    /// Get copies of all frames that were sent.
    pub fn sent_frames(&self) -> Vec<CanFrame> {
        lock(&self.sent_frames).clone()
    }

    /// Get the last sent frame, if any.
    pub fn last_sent(&self) -> Option<CanFrame> {
        lock(&self.sent_frames).last().cloned()
    }
}

impl Default for MockCanInterface {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CanInterface for MockCanInterface {
    async fn send_frame(&self, frame: &CanFrame) -> CanResult<usize> {
        if self.fail_sends {
            return Err(CanError::Write("mock transmit failure".into()));
        }
        lock(&self.sent_frames).push(frame.clone());
        Ok(frame.data.len())
    }

    async fn recv_frame(&self, timeout: Duration) -> CanResult<CanFrame> {
        lock(&self.responses)
            .pop_front()
            .ok_or_else(|| timeout_error(timeout))
    }
}

// ── Virtual bus ─────────────────────────────────────────────────

/// Shared medium for `VirtualCanPort`s.
///
/// A frame sent on one port is delivered to every other attached port. The
/// sender never sees its own frames.
#[derive(Clone, Default)]
pub struct VirtualCanBus {
    queues: Arc<Mutex<Vec<VecDeque<CanFrame>>>>,
}

impl VirtualCanBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a new port to the bus.
    pub fn attach(&self) -> VirtualCanPort {
        let mut queues = lock(&self.queues);
        queues.push(VecDeque::new());
        VirtualCanPort {
            bus: self.clone(),
            index: queues.len() - 1,
        }
    }

    /// Number of attached ports.
    pub fn port_count(&self) -> usize {
        lock(&self.queues).len()
    }
}

/// One node's connection to a `VirtualCanBus`.
pub struct VirtualCanPort {
    bus: VirtualCanBus,
    index: usize,
}

impl VirtualCanPort {
    /// Frames waiting to be received on this port.
    pub fn pending(&self) -> usize {
        lock(&self.bus.queues)
            .get(self.index)
            .map_or(0, VecDeque::len)
    }

    /// Drop everything queued for this port.
    pub fn drain(&self) -> Vec<CanFrame> {
        lock(&self.bus.queues)
            .get_mut(self.index)
            .map(|q| q.drain(..).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CanInterface for VirtualCanPort {
    async fn send_frame(&self, frame: &CanFrame) -> CanResult<usize> {
        let mut queues = lock(&self.bus.queues);
        for (i, queue) in queues.iter_mut().enumerate() {
            if i != self.index {
                queue.push_back(frame.clone());
            }
        }
        Ok(frame.data.len())
    }

    async fn recv_frame(&self, timeout: Duration) -> CanResult<CanFrame> {
        lock(&self.bus.queues)
            .get_mut(self.index)
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| timeout_error(timeout))
    }
}
