//! GDO Hardware Abstraction Layer
//!
//! This crate defines hardware abstraction traits that can be implemented
//! by board-specific code (ESP8266, RP2040, host simulators). The device
//! logic in `gdo-core` is written entirely against these traits.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Device logic (gdo-core)                │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  gdo-hal (this crate - traits)          │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  Board layer (pins, soft-UART, flash)   │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::InputPin`], [`gpio::OutputPin`] - Digital I/O
//! - [`serial::SerialLine`] - The shared half-duplex opener line
//! - [`flash::FlashStorage`] - Persistent storage

#![no_std]
#![deny(unsafe_code)]

pub mod flash;
pub mod gpio;
pub mod serial;

// Re-export key traits at crate root for convenience
pub use flash::{FlashStorage, StorageKey};
pub use gpio::{InputPin, OutputPin};
pub use serial::SerialLine;
