//! Lifecycle management.
//!
//! ```text
//! shutdown.rs: per-loop stop signal (poller teardown)
//! signals.rs:  Ctrl-C → session teardown in long-running commands
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
