//! Public runtime API surface.
//!
//! Gathers what hosts interact with: the [`AutoCrystal`] handle, the
//! [`GameSession`] collaborator trait and the error types.

pub mod errors;
pub mod handle;
pub mod session;

pub use errors::{Result, RuntimeError, SessionError};
pub use handle::AutoCrystal;
pub use session::{AgentStatus, BlockFace, EntityEvent, GameSession, Hand, Item};
