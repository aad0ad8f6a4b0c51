//! Security layer for the ISO 8583 POS protocol
//!
//! This crate provides the block-cipher collaborator (DES / 2-key 3DES),
//! the retail MAC that authenticates field 64, and the secure envelope
//! that encrypts the field payload under a transport key.

pub mod authentication;
pub mod encryption;
pub mod envelope;

pub use authentication::{attach_mac, retail_mac};
pub use encryption::{BlockCipher, DesCipher};
pub use envelope::SecureEnvelope;
