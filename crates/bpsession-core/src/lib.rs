//! Session lifecycle for bpsession
//!
//! This crate is the heart of bpsession, containing:
//! - The instance guard (pid file recording the supervising process)
//! - The launcher (command vectors and the fixed startup sequence)
//! - The session monitor (Init -> Launching -> Running -> TearingDown -> Terminated)
//! - The termination coordinator (graceful -> kill by name -> kill supervisor)

mod coordinator;
mod guard;
mod launcher;
mod logs;
mod monitor;
mod state;

pub use coordinator::*;
pub use guard::*;
pub use launcher::*;
pub use logs::*;
pub use monitor::*;
pub use state::*;
