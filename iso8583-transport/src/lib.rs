//! Transport layer for the ISO 8583 POS protocol
//!
//! Thin async host link carrying length-prefixed message frames. The codec
//! itself performs no I/O; this crate is the collaborator that delivers the
//! assembled byte buffers.

pub mod stream;
pub mod tcp;

pub use iso8583_core::{Iso8583Error, Iso8583Result};
pub use stream::HostLink;
pub use tcp::{TcpLink, TcpSettings};
