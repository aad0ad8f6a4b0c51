//! Core types and utilities for the ISO 8583 POS message codec
//!
//! This crate provides the field/message data model, error handling, and the
//! protocol dialect (field-definition table) shared by the codec, security
//! and client crates.

pub mod dialect;
pub mod error;
pub mod field;

pub use dialect::{FieldTable, terminal_dialect};
pub use error::{Iso8583Error, Iso8583Result};
pub use field::{ByteEncoding, FieldDefinition, FieldKind, FieldValue, Message};
