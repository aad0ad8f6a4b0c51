//! Retail MAC computation for field 64
//!
//! The MAC authenticates the assembled field payload (MTI + bitmap + field
//! payloads): the payload is zero-padded to whole 8-byte blocks and
//! XOR-folded into one accumulator, whose upper-hex expansion is run through
//! two block-cipher passes. The first 8 bytes of the upper-hex result are
//! the MAC.

use crate::encryption::{BLOCK_SIZE, BlockCipher, DesCipher};
use iso8583_core::{FieldTable, Iso8583Error, Iso8583Result, Message};
use iso8583_codec::MessageCodec;

/// MAC slot in the field table.
pub const MAC_FIELD: usize = 64;

/// Compute the retail MAC of `data` under an 8-byte key.
pub fn retail_mac(key: &[u8], data: &[u8]) -> Iso8583Result<[u8; 8]> {
    if key.len() != BLOCK_SIZE {
        return Err(Iso8583Error::InvalidKeyLength(key.len()));
    }
    if data.is_empty() {
        return Err(Iso8583Error::InvalidData(
            "MAC input must not be empty".to_string(),
        ));
    }
    let cipher = DesCipher::new(key)?;

    let mut padded = data.to_vec();
    let rem = padded.len() % BLOCK_SIZE;
    if rem != 0 {
        padded.resize(padded.len() + BLOCK_SIZE - rem, 0);
    }

    let mut acc = [0u8; BLOCK_SIZE];
    for block in padded.chunks_exact(BLOCK_SIZE) {
        for (a, b) in acc.iter_mut().zip(block) {
            *a ^= b;
        }
    }

    // Two encryption passes over the hex expansion of the accumulator.
    let acc_hex = hex::encode_upper(acc);
    let acc_hex = acc_hex.as_bytes();
    let mut stage = cipher.encrypt(&acc_hex[..BLOCK_SIZE])?;
    for (s, h) in stage.iter_mut().zip(&acc_hex[BLOCK_SIZE..]) {
        *s ^= h;
    }
    let stage = cipher.encrypt(&stage)?;

    let out_hex = hex::encode_upper(stage);
    let mut mac = [0u8; 8];
    mac.copy_from_slice(&out_hex.as_bytes()[..8]);
    Ok(mac)
}

/// Compute the MAC over all other populated fields and store it as
/// field 64. Must be called after every other field is finalized, since the
/// MAC authenticates their combined bytes.
pub fn attach_mac(msg: &mut Message, table: &FieldTable, key: &[u8]) -> Iso8583Result<()> {
    msg.fields.remove(&MAC_FIELD);
    let payload = MessageCodec::new(table).encode_fields(msg)?;
    let mac = retail_mac(key, &payload)?;
    msg.set_field(MAC_FIELD, hex::encode_upper(mac));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use iso8583_core::terminal_dialect;

    const MAC_KEY: &str = "1CDC70ABD616015E";

    fn key() -> Vec<u8> {
        hex::decode(MAC_KEY).unwrap()
    }

    #[test]
    fn test_mac_is_deterministic() {
        let data = b"0200 sample field payload";
        let first = retail_mac(&key(), data).unwrap();
        let second = retail_mac(&key(), data).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_mac_is_upper_hex_text() {
        let mac = retail_mac(&key(), b"test").unwrap();
        assert!(mac.iter().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_lowercase()));
    }

    #[test]
    fn test_single_bit_flip_changes_mac() {
        let data = b"0200 sample field payload".to_vec();
        let mut flipped = data.clone();
        flipped[3] ^= 0x01;
        assert_ne!(
            retail_mac(&key(), &data).unwrap(),
            retail_mac(&key(), &flipped).unwrap()
        );
    }

    #[test]
    fn test_mac_rejects_bad_inputs() {
        assert!(matches!(
            retail_mac(&[0u8; 16], b"data"),
            Err(Iso8583Error::InvalidKeyLength(16))
        ));
        assert!(matches!(
            retail_mac(&key(), b""),
            Err(Iso8583Error::InvalidData(_))
        ));
    }

    #[test]
    fn test_attach_mac_fills_field_64_last() {
        let table = terminal_dialect();
        let mut msg = Message::new("6004010000", "0200");
        msg.header = Some("602200000000".to_string());
        msg.set_field(4, "000000000001");
        msg.set_field(11, "000025");
        attach_mac(&mut msg, table, &key()).unwrap();

        let mac_hex = msg.field_scalar(64).unwrap().to_string();
        assert_eq!(mac_hex.len(), 16);

        // The stored MAC matches a recomputation over the other fields.
        let mut without_mac = msg.clone();
        without_mac.fields.remove(&64);
        let payload = MessageCodec::new(table).encode_fields(&without_mac).unwrap();
        let expected = retail_mac(&key(), &payload).unwrap();
        assert_eq!(mac_hex, hex::encode_upper(expected));

        // Re-attaching over a message that already has a MAC is stable.
        attach_mac(&mut msg, table, &key()).unwrap();
        assert_eq!(msg.field_scalar(64), Some(mac_hex.as_str()));
    }

    #[test]
    fn test_message_with_mac_encodes() {
        let table = terminal_dialect();
        let mut msg = Message::new("6004010000", "0200");
        msg.header = Some("602200000000".to_string());
        msg.set_field(4, "000000000001");
        attach_mac(&mut msg, table, &key()).unwrap();
        let codec = MessageCodec::new(table);
        let raw = codec.encode(&msg).unwrap();
        let decoded = codec.decode(&raw).unwrap();
        assert_eq!(decoded.field_scalar(64), msg.field_scalar(64));
    }
}
