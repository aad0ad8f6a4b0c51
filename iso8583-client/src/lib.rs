//! POS terminal client for the ISO 8583 protocol
//!
//! Message builders for terminal transactions and a client that drives a
//! full request/response exchange: MAC attachment, optional secure
//! envelope, and framed delivery over a host link.

pub mod builder;
pub mod client;

pub use builder::ScanPurchaseBuilder;
pub use client::TerminalClient;
