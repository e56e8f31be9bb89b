//! Host interfaces for bpsession
//!
//! This crate defines the boundary between the session lifecycle logic and
//! the operating system: the process table (liveness scanning), process
//! spawning, signal delivery and the clock. It contains no platform code
//! itself; [`MockHost`] implements it in memory for tests.

mod command;
mod handle;
mod mock;
mod traits;

pub use command::*;
pub use handle::*;
pub use mock::*;
pub use traits::*;
