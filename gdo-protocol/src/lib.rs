//! GDO Wire Protocol
//!
//! This crate defines the wire-level types for the opener's rolling-code
//! serial bus: frame constants and the resynchronizing frame scanner, the
//! boundary contract for the keyed wireline cipher, and the command-code
//! table with its payload data words.
//!
//! # Frame format
//!
//! Every frame is exactly 19 bytes and begins with a fixed preamble:
//!
//! ```text
//! ┌──────────────────┬───────────────────────────────┐
//! │ PREAMBLE         │ CIPHERTEXT                    │
//! │ 55 01 00 (3B)    │ counter-obfuscated body (16B) │
//! └──────────────────┴───────────────────────────────┘
//! ```
//!
//! The body is opaque to this crate; [`codec::WirelineCodec`] maps it
//! to/from `{rolling counter, fixed id, data word}`. The cipher itself is
//! an external collaborator and must be bit-exact with the real hardware.

#![no_std]
#![deny(unsafe_code)]

pub mod codec;
pub mod command;
pub mod frame;

pub use codec::{DecodedPacket, WirelineCodec};
pub use command::Command;
pub use frame::{Frame, FrameSynchronizer, FRAME_LENGTH, PREAMBLE};
