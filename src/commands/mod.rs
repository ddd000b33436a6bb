//! Command vocabulary and system actions
//!
//! The registry maps trigger phrases to actions; `actions` holds the
//! action variants and the OS launcher that executes the system-level
//! ones.

mod actions;
mod registry;

pub use actions::{ActionError, ActionRunner, CommandAction, SystemAction, SystemLauncher};
pub use registry::{CommandEntry, CommandRegistry};
