//! Deterministic game logic
//!
//! All gameplay rules live here. This module must stay pure and
//! deterministic:
//! - Fixed timestep only, callers sub-step
//! - No randomness
//! - No rendering or platform dependencies
//!
//! Events are buffered in program order and drained by the caller after
//! each `advance`; subscribers must not call back into the simulation.

pub mod ring;
pub mod state;
pub mod tick;

pub use ring::convert_loop;
pub use state::{Action, GameEvent, GameLogic, GameState, RotateDirection};
