//! Board-agnostic device logic for the GDO driver
//!
//! This crate contains all driver logic that does not depend on specific
//! hardware implementations:
//!
//! - Observed state fields with deferred, coalesced change notification
//! - Cooperative named-timer scheduler (one-shots and bounded retries)
//! - Rolling code counter discipline
//! - Door travel model (position estimation, duration calibration)
//! - Obstruction pulse heuristic
//! - The command dispatcher, status-sync orchestrator and transmitter
//!   ([`driver::GdoDriver`])

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod counter;
pub mod driver;
pub mod motion;
pub mod obstruction;
pub mod scheduler;
pub mod state;

pub use driver::GdoDriver;
