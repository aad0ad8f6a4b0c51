//! Variable-length field header codec
//!
//! A variable field's payload is preceded by a BCD length header: one byte
//! for `Var1` (LLVAR, up to 99), two bytes for `Var2` (LLLVAR, up to 999,
//! right-aligned BCD of the 3-digit length) and two bytes for `Var2Wide`
//! (LLLLVAR, up to 9999, plain digit-pair packing).

use iso8583_core::{FieldKind, Iso8583Error, Iso8583Result};

/// Encode a payload length as the BCD header for the given field kind.
pub fn encode_length(kind: FieldKind, length: usize) -> Iso8583Result<Vec<u8>> {
    if length > kind.max_length() {
        return Err(Iso8583Error::ParseLengthFailed(format!(
            "length {} exceeds {:?} maximum {}",
            length,
            kind,
            kind.max_length()
        )));
    }
    match kind {
        FieldKind::Fixed => Ok(Vec::new()),
        FieldKind::Var1 => Ok(vec![((length / 10) << 4 | length % 10) as u8]),
        FieldKind::Var2 => Ok(vec![
            (length / 100) as u8,
            ((length % 100 / 10) << 4 | length % 10) as u8,
        ]),
        FieldKind::Var2Wide => Ok(vec![
            ((length / 1000) << 4 | length / 100 % 10) as u8,
            ((length / 10 % 10) << 4 | length % 10) as u8,
        ]),
    }
}

fn nibble(byte: u8, high: bool) -> Iso8583Result<usize> {
    let n = if high { byte >> 4 } else { byte & 0x0F };
    if n > 9 {
        return Err(Iso8583Error::ParseLengthFailed(format!(
            "non-BCD nibble 0x{:X} in length header",
            n
        )));
    }
    Ok(n as usize)
}

/// Decode a length header, returning the payload length and the number of
/// header bytes consumed.
pub fn decode_length(kind: FieldKind, raw: &[u8]) -> Iso8583Result<(usize, usize)> {
    let size = kind.header_size();
    if raw.len() < size {
        return Err(Iso8583Error::TruncatedMessage {
            needed: size,
            available: raw.len(),
        });
    }
    match kind {
        FieldKind::Fixed => Ok((0, 0)),
        FieldKind::Var1 => Ok((nibble(raw[0], true)? * 10 + nibble(raw[0], false)?, 1)),
        FieldKind::Var2 => {
            if raw[0] >> 4 != 0 {
                return Err(Iso8583Error::ParseLengthFailed(format!(
                    "LLLVAR header byte 0x{:02X} has a non-zero high nibble",
                    raw[0]
                )));
            }
            let length =
                nibble(raw[0], false)? * 100 + nibble(raw[1], true)? * 10 + nibble(raw[1], false)?;
            Ok((length, 2))
        }
        FieldKind::Var2Wide => {
            let length = nibble(raw[0], true)? * 1000
                + nibble(raw[0], false)? * 100
                + nibble(raw[1], true)? * 10
                + nibble(raw[1], false)?;
            Ok((length, 2))
        }
    }
}
