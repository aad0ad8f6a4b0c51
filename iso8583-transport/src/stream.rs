//! Host link trait for delivering message frames

use async_trait::async_trait;
use iso8583_core::Iso8583Result;

/// Interface to a physical link to the acquiring host.
///
/// Frames on the wire are a 2-byte big-endian payload length followed by
/// the payload; implementations add the prefix on send and strip it on
/// receive, so callers exchange bare message buffers.
#[async_trait]
pub trait HostLink: Send {
    /// Open the link.
    async fn open(&mut self) -> Iso8583Result<()>;

    /// Send one message buffer as a length-prefixed frame.
    async fn send_frame(&mut self, payload: &[u8]) -> Iso8583Result<()>;

    /// Receive one frame, returning its payload without the length prefix.
    async fn receive_frame(&mut self) -> Iso8583Result<Vec<u8>>;

    /// Check whether the link is open.
    fn is_open(&self) -> bool;

    /// Close the link.
    async fn close(&mut self) -> Iso8583Result<()>;
}
