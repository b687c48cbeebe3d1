//! TCDS usage guard.
//!
//! Gates access to the protected TCDS mode behind a small escalating state
//! machine (`Normal -> Alert -> Locked`) that survives restarts through a local
//! state file, and records every reported event in an append-only audit log.
//!
//! ```no_run
//! use tcds_guard::Guard;
//!
//! let mut guard = Guard::new(Some("laboratorio"), Some("MX"));
//! if guard.guard_usage().is_ok() {
//!     // protected logic
//! }
//! guard.register_event("yellow", "ambiguous request to control third parties");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod audit;
pub mod config;
pub mod guard;
pub mod logging;
pub mod store;

pub use guard::{Guard, GuardError, GuardStatus, SecurityState, Severity};
