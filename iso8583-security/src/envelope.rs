//! Secure message envelope
//!
//! When a transport key is supplied, the assembled field payload
//! (MTI + bitmap + fields) travels encrypted. The plaintext prefix carries
//! the TPDU and protocol header, a marker byte, two identity slots, the
//! 4-digit decimal plaintext length and a fixed zero filler; the ciphertext
//! follows. Opening reverses the exact same framing and hands the spliced
//! buffer to the ordinary message decoder.
//!
//! Note: deployed hosts fill *both* identity slots from the field-42 value
//! (field 41 was plainly intended for the second); that framing is kept
//! byte-for-byte and pinned down in the tests.

use crate::encryption::{BLOCK_SIZE, BlockCipher, DesCipher};
use iso8583_core::{FieldTable, Iso8583Error, Iso8583Result, Message};
use iso8583_codec::MessageCodec;

/// First byte of the envelope header.
pub const ENVELOPE_MARKER: u8 = 0xE6;

/// Width of the decimal plaintext-length marker.
const LENGTH_DIGITS: usize = 4;

/// Trailing ASCII-zero filler in the envelope header.
const FILLER: &[u8; 12] = b"000000000000";

/// TPDU (5 bytes) plus protocol header (6 bytes).
const PLAIN_PREFIX: usize = 11;

/// Envelope codec bound to a field table and a transport key.
pub struct SecureEnvelope<'a> {
    table: &'a FieldTable,
    cipher: DesCipher,
}

impl<'a> SecureEnvelope<'a> {
    /// Create an envelope codec. The transport key must be 8 or 16 bytes.
    pub fn new(table: &'a FieldTable, transport_key: &[u8]) -> Iso8583Result<Self> {
        Ok(Self {
            table,
            cipher: DesCipher::new(transport_key)?,
        })
    }

    fn identity_width(&self) -> Iso8583Result<usize> {
        self.table
            .get(&42)
            .map(|def| def.length)
            .ok_or(Iso8583Error::UndefinedField(42))
    }

    /// Serialize `msg` with its field payload encrypted under the transport
    /// key.
    pub fn seal(&self, msg: &Message) -> Iso8583Result<Vec<u8>> {
        let codec = MessageCodec::new(self.table);
        let fields_part = codec.encode_fields(msg)?;
        let full = codec.encode(msg)?;
        let prefix_len = full.len() - fields_part.len();
        if prefix_len != PLAIN_PREFIX {
            return Err(Iso8583Error::InvalidHeader(
                "secure envelope requires the 12-digit protocol header".to_string(),
            ));
        }

        let id_width = self.identity_width()?;
        let merchant_id = msg
            .field_scalar(42)
            .ok_or(Iso8583Error::MissingField(42))?;
        if merchant_id.len() != id_width {
            return Err(Iso8583Error::InvalidData(format!(
                "field 42 value must be exactly {} bytes for the envelope header",
                id_width
            )));
        }
        if fields_part.len() > 9999 {
            return Err(Iso8583Error::InvalidData(format!(
                "field payload of {} bytes does not fit the 4-digit envelope length",
                fields_part.len()
            )));
        }

        let mut out = Vec::with_capacity(full.len() + 64);
        out.extend_from_slice(&full[..PLAIN_PREFIX]);
        out.push(ENVELOPE_MARKER);
        out.extend_from_slice(merchant_id.as_bytes());
        out.extend_from_slice(merchant_id.as_bytes());
        out.extend_from_slice(format!("{:04}", fields_part.len()).as_bytes());
        out.extend_from_slice(FILLER);
        out.extend_from_slice(&self.cipher.encrypt(&fields_part)?);
        Ok(out)
    }

    /// Decrypt and decode a sealed message.
    pub fn open(&self, raw: &[u8]) -> Iso8583Result<Message> {
        let id_width = self.identity_width()?;
        let head_len = 1 + 2 * id_width + LENGTH_DIGITS + FILLER.len();
        let needed = PLAIN_PREFIX + head_len + BLOCK_SIZE;
        if raw.len() < needed {
            return Err(Iso8583Error::TruncatedMessage {
                needed,
                available: raw.len(),
            });
        }
        if raw[PLAIN_PREFIX] != ENVELOPE_MARKER {
            return Err(Iso8583Error::InvalidData(format!(
                "envelope marker 0x{:02X} is not 0x{:02X}",
                raw[PLAIN_PREFIX], ENVELOPE_MARKER
            )));
        }

        let len_offset = PLAIN_PREFIX + 1 + 2 * id_width;
        let len_text = std::str::from_utf8(&raw[len_offset..len_offset + LENGTH_DIGITS])
            .map_err(|e| Iso8583Error::InvalidData(e.to_string()))?;
        let plain_len: usize = len_text
            .parse()
            .map_err(|_| Iso8583Error::InvalidData(format!("bad plaintext length {:?}", len_text)))?;

        let mut plain = self.cipher.decrypt(&raw[PLAIN_PREFIX + head_len..])?;
        if plain.len() < plain_len {
            return Err(Iso8583Error::TruncatedMessage {
                needed: plain_len,
                available: plain.len(),
            });
        }
        plain.truncate(plain_len);

        let mut data = Vec::with_capacity(PLAIN_PREFIX + plain.len());
        data.extend_from_slice(&raw[..PLAIN_PREFIX]);
        data.extend_from_slice(&plain);
        MessageCodec::new(self.table).decode(&data)
    }
}
