//! Inbound commands to the controller.
//!
//! Debug and administrative actions requested by a console or test rig,
//! as opposed to the collaborator callbacks that arrive as
//! [`ControllerMsg`](super::mailbox::ControllerMsg)s.

use crate::dprint::LogLevel;
use crate::product::ids::StateId;

/// Commands that adapters can send into the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerCommand {
    /// Force the machine into a specific state (debug / testing only).
    ForceState(StateId),

    /// Set a facility's level.  `None` disables the facility.  The name may
    /// be exact, `all` or a `prefix*` pattern.
    SetLogLevel {
        facility: String,
        level: Option<LogLevel>,
    },

    /// Emit the logging status table.
    LoggingStatus,

    /// Emit the current state path.
    QueryState,

    /// Halt the network-standby transition (used before a software update).
    SetHalt(bool),
}
