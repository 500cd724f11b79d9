//! tincd process lifecycle management.
//!
//! - [`supervisor`] — launch, restart-on-death, bounded graceful shutdown
//! - [`probe`] — daemon version probe and old-instance PID lookup
//! - [`preflight`] — root / TUN device checks before anything touches
//!   the system
//! - [`error`] — [`SupervisorError`]

pub mod error;
pub mod preflight;
pub mod probe;
pub mod supervisor;

pub use error::SupervisorError;
pub use supervisor::{Supervisor, SupervisorState};
