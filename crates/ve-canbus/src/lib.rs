//! CAN-FD bus layer for the virtual ECU network.
//!
//! - `CanInterface` trait with a SocketCAN-FD implementation (Linux) and
//!   in-memory `MockCanInterface` / `VirtualCanBus` for tests
//! - `FrameCodec` for the optional authenticated-encryption envelope
//! - `SecureBus` joining a transport and a codec
//! - `MessageRegistry` + `Scheduler` for periodic transmission
//! - `TimingMonitor` for inter-arrival anomaly detection
//! - `GatewayPolicy` allow-lists for the two-segment gateway

pub mod bus;
pub mod clock;
pub mod codec;
pub mod error;
pub mod interface;
pub mod layout;
pub mod mock;
pub mod monitor;
pub mod policy;
pub mod registry;
pub mod scheduler;
pub mod timing;
pub mod types;

pub use bus::SecureBus;
pub use clock::Clock;
pub use codec::{EncryptionKey, FrameCodec};
pub use error::{CanError, CanResult};
pub use interface::CanInterface;
#[cfg(target_os = "linux")]
pub use interface::SocketCanInterface;
pub use mock::{MockCanInterface, VirtualCanBus};
pub use monitor::{Observation, TimingMonitor};
pub use policy::GatewayPolicy;
pub use registry::{DefineOutcome, MessageRegistry};
pub use scheduler::Scheduler;
pub use timing::TimingTable;
pub use types::CanFrame;
