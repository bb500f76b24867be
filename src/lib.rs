//! Speaker product controller library.
//!
//! A hierarchical state machine sequencing the product through boot,
//! setup, standby and playback, plus the DPrint logging engine every
//! component logs through.  Exposes the pure-logic modules for integration
//! testing and for hosts embedding the controller.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod dprint;
pub mod error;
pub mod hsm;
pub mod product;

pub use error::{Error, Result};
