//! In-memory game session for exercising the automation without a client.
//!
//! [`SimSession`] implements [`crystal_runtime::GameSession`] over a
//! [`crystal_core::BlockGrid`]; [`arena`] builds a ready-made duel.

pub mod arena;
pub mod error;
pub mod session;

pub use error::SimError;
pub use session::{SimAction, SimSession};
