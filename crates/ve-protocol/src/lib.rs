pub mod diagnostic;
pub mod ids;
pub mod message;
pub mod role;
pub mod state;

pub use diagnostic::*;
pub use ids::*;
pub use message::*;
pub use role::*;
pub use state::*;
