//! Virtual ECU node: the library behind the `ve-node` binary.
//!
//! Exposes the runtime pieces so integration tests can drive several nodes
//! over one in-memory bus.

pub mod config;
pub mod console;
pub mod dynamics;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod runtime;
pub mod serial;
pub mod telemetry;
pub mod values;

pub use config::{Cli, NodeConfig};
pub use error::{NodeError, NodeResult};
pub use runtime::{Dispatch, EcuNode, StepReport};
