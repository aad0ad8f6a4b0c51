//! Wire codec for the ISO 8583 POS protocol
//!
//! This crate turns structured transaction messages into the compact binary
//! wire format and back: BCD digit packing, variable-length headers,
//! per-field encoding dispatch, the presence bitmap (with its secondary
//! extension), and full message assembly/disassembly.

pub mod bcd;
pub mod bitmap;
pub mod field;
pub mod length;
pub mod message;

pub use iso8583_core::{Iso8583Error, Iso8583Result};
pub use field::{decode_field, encode_field};
pub use message::MessageCodec;
