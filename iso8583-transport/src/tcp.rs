//! TCP host link implementation

use crate::stream::HostLink;
use async_trait::async_trait;
use bytes::BytesMut;
use iso8583_core::{Iso8583Error, Iso8583Result};
use std::io;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// TCP host link settings
#[derive(Debug, Clone)]
pub struct TcpSettings {
    pub address: String,
    pub timeout: Option<Duration>,
}

impl TcpSettings {
    /// Create new settings with the default 30-second timeout.
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
            timeout: Some(Duration::from_secs(30)),
        }
    }

    /// Create settings with an explicit timeout.
    pub fn with_timeout(address: &str, timeout: Duration) -> Self {
        Self {
            address: address.to_string(),
            timeout: Some(timeout),
        }
    }
}

/// TCP host link carrying length-prefixed frames.
#[derive(Debug)]
pub struct TcpLink {
    settings: TcpSettings,
    stream: Option<TcpStream>,
}

impl TcpLink {
    /// Create a closed link with the given settings.
    pub fn new(settings: TcpSettings) -> Self {
        Self {
            settings,
            stream: None,
        }
    }

    /// Wrap an already-connected stream (used by tests and servers).
    pub fn from_stream(stream: TcpStream) -> Self {
        Self {
            settings: TcpSettings::new(""),
            stream: Some(stream),
        }
    }

    fn stream_mut(&mut self) -> Iso8583Result<&mut TcpStream> {
        self.stream
            .as_mut()
            .ok_or_else(|| Iso8583Error::Connection(io::Error::new(
                io::ErrorKind::NotConnected,
                "link is not open",
            )))
    }

    async fn timed<T>(
        timeout: Option<Duration>,
        fut: impl Future<Output = io::Result<T>>,
    ) -> Iso8583Result<T> {
        let result = match timeout {
            Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
                Iso8583Error::Connection(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "host did not answer in time",
                ))
            })?,
            None => fut.await,
        };
        Ok(result?)
    }
}

#[async_trait]
impl HostLink for TcpLink {
    async fn open(&mut self) -> Iso8583Result<()> {
        let stream =
            Self::timed(self.settings.timeout, TcpStream::connect(&self.settings.address)).await?;
        self.stream = Some(stream);
        Ok(())
    }

    async fn send_frame(&mut self, payload: &[u8]) -> Iso8583Result<()> {
        if payload.len() > u16::MAX as usize {
            return Err(Iso8583Error::InvalidData(format!(
                "frame of {} bytes does not fit a 2-byte length prefix",
                payload.len()
            )));
        }
        let timeout = self.settings.timeout;
        let stream = self.stream_mut()?;
        let mut frame = BytesMut::with_capacity(2 + payload.len());
        frame.extend_from_slice(&(payload.len() as u16).to_be_bytes());
        frame.extend_from_slice(payload);
        Self::timed(timeout, stream.write_all(&frame)).await?;
        Self::timed(timeout, stream.flush()).await?;
        Ok(())
    }

    async fn receive_frame(&mut self) -> Iso8583Result<Vec<u8>> {
        let timeout = self.settings.timeout;
        let stream = self.stream_mut()?;
        let mut prefix = [0u8; 2];
        Self::timed(timeout, stream.read_exact(&mut prefix)).await?;
        let length = u16::from_be_bytes(prefix) as usize;
        let mut payload = vec![0u8; length];
        Self::timed(timeout, stream.read_exact(&mut payload)).await?;
        Ok(payload)
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    async fn close(&mut self) -> Iso8583Result<()> {
        if let Some(mut stream) = self.stream.take() {
            stream.shutdown().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_frame_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let echo = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut peer = TcpLink::from_stream(stream);
            let payload = peer.receive_frame().await.unwrap();
            peer.send_frame(&payload).await.unwrap();
        });

        let mut link = TcpLink::new(TcpSettings::new(&address));
        assert!(!link.is_open());
        link.open().await.unwrap();
        assert!(link.is_open());

        link.send_frame(&[0x60, 0x04, 0x01, 0x00, 0x00]).await.unwrap();
        let reply = link.receive_frame().await.unwrap();
        assert_eq!(reply, vec![0x60, 0x04, 0x01, 0x00, 0x00]);

        link.close().await.unwrap();
        assert!(!link.is_open());
        echo.await.unwrap();
    }

    #[tokio::test]
    async fn test_send_on_closed_link() {
        let mut link = TcpLink::new(TcpSettings::new("127.0.0.1:1"));
        assert!(matches!(
            link.send_frame(&[0x00]).await,
            Err(Iso8583Error::Connection(_))
        ));
    }
}
