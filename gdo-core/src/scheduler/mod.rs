//! Cooperative timer scheduling
//!
//! Named one-shot timers and bounded retry loops, fired only between
//! processing steps.

pub mod timers;

pub use timers::{Fired, Scheduler, Task, TimerKey};
