//! Terminal client: one request/response exchange with the acquiring host

use iso8583_codec::MessageCodec;
use iso8583_core::{FieldTable, Iso8583Result, Message, terminal_dialect};
use iso8583_security::{SecureEnvelope, attach_mac};
use iso8583_transport::HostLink;

/// Client driving framed message exchanges over a host link.
///
/// With a MAC key set, field 64 is computed and attached to every outgoing
/// message after all other fields. With a transport key set, the field part
/// of both directions travels inside the secure envelope.
pub struct TerminalClient<L: HostLink> {
    link: L,
    table: &'static FieldTable,
    mac_key: Option<Vec<u8>>,
    transport_key: Option<Vec<u8>>,
}

impl<L: HostLink> TerminalClient<L> {
    /// Create a client over the given link using the terminal dialect.
    pub fn new(link: L) -> Self {
        Self {
            link,
            table: terminal_dialect(),
            mac_key: None,
            transport_key: None,
        }
    }

    /// Attach a MAC key; outgoing messages get field 64 computed over all
    /// other fields.
    pub fn with_mac_key(mut self, key: Vec<u8>) -> Self {
        self.mac_key = Some(key);
        self
    }

    /// Attach a transport key; both directions use the secure envelope.
    pub fn with_transport_key(mut self, key: Vec<u8>) -> Self {
        self.transport_key = Some(key);
        self
    }

    /// Send one request and decode the host's response.
    pub async fn exchange(&mut self, msg: &mut Message) -> Iso8583Result<Message> {
        if let Some(key) = &self.mac_key {
            attach_mac(msg, self.table, key)?;
        }
        log::debug!("request:\n{}", msg);

        let codec = MessageCodec::new(self.table);
        let request = match &self.transport_key {
            Some(key) => SecureEnvelope::new(self.table, key)?.seal(msg)?,
            None => codec.encode(msg)?,
        };

        if !self.link.is_open() {
            self.link.open().await?;
        }
        self.link.send_frame(&request).await?;
        let raw = self.link.receive_frame().await?;

        let response = match &self.transport_key {
            Some(key) => SecureEnvelope::new(self.table, key)?.open(&raw)?,
            None => codec.decode(&raw)?,
        };
        log::debug!("response:\n{}", response);
        Ok(response)
    }

    /// Close the underlying link.
    pub async fn close(&mut self) -> Iso8583Result<()> {
        self.link.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ScanPurchaseBuilder;
    use async_trait::async_trait;
    use iso8583_core::Iso8583Error;

    /// In-memory link answering every request with a canned approval.
    struct FakeHost {
        open: bool,
        transport_key: Option<Vec<u8>>,
        last_request: Option<Vec<u8>>,
    }

    impl FakeHost {
        fn new(transport_key: Option<Vec<u8>>) -> Self {
            Self {
                open: false,
                transport_key,
                last_request: None,
            }
        }

        fn approval_for(&self, request: &Message) -> Message {
            let mut resp = Message::new(&request.tpdu, "0210");
            resp.header = request.header.clone();
            resp.set_field(11, request.field_scalar(11).unwrap_or("000000"));
            resp.set_field(39, "00");
            resp.set_field(41, request.field_scalar(41).unwrap_or_default());
            resp.set_field(42, request.field_scalar(42).unwrap_or_default());
            resp
        }
    }

    #[async_trait]
    impl HostLink for FakeHost {
        async fn open(&mut self) -> Iso8583Result<()> {
            self.open = true;
            Ok(())
        }

        async fn send_frame(&mut self, payload: &[u8]) -> Iso8583Result<()> {
            self.last_request = Some(payload.to_vec());
            Ok(())
        }

        async fn receive_frame(&mut self) -> Iso8583Result<Vec<u8>> {
            let table = terminal_dialect();
            let raw = self
                .last_request
                .as_deref()
                .ok_or_else(|| Iso8583Error::InvalidData("no request seen".to_string()))?;
            let request = match &self.transport_key {
                Some(key) => SecureEnvelope::new(table, key)?.open(raw)?,
                None => MessageCodec::new(table).decode(raw)?,
            };
            let response = self.approval_for(&request);
            match &self.transport_key {
                Some(key) => SecureEnvelope::new(table, key)?.seal(&response),
                None => MessageCodec::new(table).encode(&response),
            }
        }

        fn is_open(&self) -> bool {
            self.open
        }

        async fn close(&mut self) -> Iso8583Result<()> {
            self.open = false;
            Ok(())
        }
    }

    fn purchase() -> Message {
        ScanPurchaseBuilder::new("00003042", "666100041213175")
            .amount("000000000001")
            .trace_number("000025")
            .batch_number("000001")
            .scan_code("284753193293963468")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_plain_exchange() {
        let mac_key = hex::decode("1CDC70ABD616015E").unwrap();
        let mut client = TerminalClient::new(FakeHost::new(None)).with_mac_key(mac_key);
        let mut request = purchase();
        let response = client.exchange(&mut request).await.unwrap();

        // The MAC was attached before sending.
        assert_eq!(request.field_scalar(64).map(str::len), Some(16));
        assert_eq!(response.mti, "0210");
        assert_eq!(response.field_scalar(39), Some("00"));
        assert_eq!(response.field_scalar(11), Some("000025"));
    }

    #[tokio::test]
    async fn test_sealed_exchange() {
        let tdk = hex::decode("4551E676DFEFE6109252683B64B66E1F").unwrap();
        let mut client =
            TerminalClient::new(FakeHost::new(Some(tdk.clone()))).with_transport_key(tdk);
        let mut request = purchase();
        let response = client.exchange(&mut request).await.unwrap();
        assert_eq!(response.mti, "0210");
        assert_eq!(response.field_scalar(42), Some("666100041213175"));
        client.close().await.unwrap();
    }
}
