//! Application core: the controller host and its boundary.
//!
//! The product rules live in [`crate::product`]; this module wraps them in
//! a host that caches collaborator status, gates boot on module readiness
//! and serialises inbound callbacks.  All interaction with the outside
//! world happens through the **port traits** in [`ports`], keeping this
//! layer testable without real collaborators.

pub mod commands;
pub mod controller;
pub mod events;
pub mod mailbox;
pub mod ports;
