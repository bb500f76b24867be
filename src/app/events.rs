//! Outbound controller events.
//!
//! The [`ProductController`](super::controller::ProductController) emits
//! these through the [`EventSink`](super::ports::EventSink) port.  Adapters
//! on the other side decide what to do with them.

use crate::product::ids::StateId;

/// Structured events emitted by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    /// The state machine has been initialised (carries the leaf it settled in).
    Started(StateId),

    /// The current leaf changed.
    StateChanged { from: StateId, to: StateId },

    /// Every module reported ready.
    ModulesReady,

    /// Reply to a state query: the active path, root first.
    CurrentState(Vec<StateId>),

    /// Snapshot of the logging table, one line per entry.
    LoggingStatus(Vec<String>),
}
