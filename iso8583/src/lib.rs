//! ISO 8583 POS terminal message codec
//!
//! Serializes structured transaction data into the compact binary wire
//! format used between POS terminals and acquiring hosts, and parses raw
//! bytes back into structured fields: header envelope, presence bitmap,
//! per-field payloads, retail MAC and secure envelope.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `iso8583-core`: data model, error handling, protocol dialect
//! - `iso8583-codec`: BCD/length/field/bitmap codecs and message assembly
//! - `iso8583-security`: block cipher, retail MAC, secure envelope
//! - `iso8583-transport`: framed host link (TCP)
//! - `iso8583-client`: message builders and terminal client
//!
//! # Usage
//!
//! ```no_run
//! use iso8583::{MessageCodec, terminal_dialect};
//! use iso8583::client::ScanPurchaseBuilder;
//!
//! # fn main() -> iso8583::Iso8583Result<()> {
//! let msg = ScanPurchaseBuilder::new("00003042", "666100041213175")
//!     .amount("000000000001")
//!     .trace_number("000025")
//!     .batch_number("000001")
//!     .scan_code("284753193293963468")
//!     .build()?;
//! let raw = MessageCodec::new(terminal_dialect()).encode_with_length_prefix(&msg)?;
//! # let _ = raw;
//! # Ok(())
//! # }
//! ```

// Re-export core types
pub use iso8583_core::{
    ByteEncoding, FieldDefinition, FieldKind, FieldTable, FieldValue, Iso8583Error, Iso8583Result,
    Message, terminal_dialect,
};

// Re-export the message codec
pub use iso8583_codec::MessageCodec;

// Re-export the security API
pub mod security {
    pub use iso8583_security::*;
}

// Re-export the transport API
pub mod transport {
    pub use iso8583_transport::*;
}

// Re-export the client API
pub mod client {
    pub use iso8583_client::*;
}
