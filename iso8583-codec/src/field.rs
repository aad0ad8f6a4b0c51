//! Per-field payload codec
//!
//! Encodes a field value to its wire payload (length header plus body) from
//! its definition, and decodes the inverse, reporting the exact number of
//! bytes consumed. Composite fields encode their fixed sub-fields in
//! declared order behind a single outer length header carrying the total
//! encoded byte count.

use crate::bcd;
use crate::length;
use iso8583_core::{ByteEncoding, FieldDefinition, FieldKind, FieldValue, Iso8583Error, Iso8583Result};

/// Pad or validate a digit string against a fixed declared digit count.
///
/// Shorter values are zero-left-padded. An `RBcd` value exactly one digit
/// longer than declared whose leading digit is '0' has that zero dropped,
/// so odd-length reverse-packed values round-trip; anything else longer
/// than declared is an error.
fn adjust_digits(
    index: usize,
    encoding: ByteEncoding,
    declared: usize,
    value: &str,
) -> Iso8583Result<String> {
    if value.len() == declared {
        return Ok(value.to_string());
    }
    if value.len() < declared {
        let mut padded = "0".repeat(declared - value.len());
        padded.push_str(value);
        return Ok(padded);
    }
    if encoding == ByteEncoding::RBcd && value.len() == declared + 1 && value.starts_with('0') {
        return Ok(value[1..].to_string());
    }
    Err(Iso8583Error::ValueTooLong {
        field: index,
        declared,
        actual: value.len(),
    })
}

/// Encode a scalar payload body, returning the body bytes and the logical
/// length to put in a variable-length header (digits for BCD kinds, bytes
/// for text and binary).
fn encode_scalar(
    index: usize,
    def: &FieldDefinition,
    value: &str,
) -> Iso8583Result<(Vec<u8>, usize)> {
    let fixed = def.kind == FieldKind::Fixed;
    match def.encoding {
        ByteEncoding::Ascii => {
            let mut body = value.as_bytes().to_vec();
            if fixed {
                if body.len() > def.length {
                    return Err(Iso8583Error::ValueTooLong {
                        field: index,
                        declared: def.length,
                        actual: body.len(),
                    });
                }
                body.resize(def.length, b' ');
            }
            let len = body.len();
            Ok((body, len))
        }
        ByteEncoding::Binary => {
            let decoded =
                hex::decode(value).map_err(|e| Iso8583Error::InvalidHex(e.to_string()))?;
            let mut body = decoded;
            if fixed {
                if body.len() > def.length {
                    return Err(Iso8583Error::ValueTooLong {
                        field: index,
                        declared: def.length,
                        actual: body.len(),
                    });
                }
                if body.len() < def.length {
                    let mut padded = vec![0u8; def.length - body.len()];
                    padded.extend_from_slice(&body);
                    body = padded;
                }
            }
            let len = body.len();
            Ok((body, len))
        }
        ByteEncoding::Bcd | ByteEncoding::RBcd => {
            let digits = if fixed {
                adjust_digits(index, def.encoding, def.length, value)?
            } else {
                value.to_string()
            };
            let body = match def.encoding {
                ByteEncoding::Bcd => bcd::pack_lbcd(&digits)?,
                _ => bcd::pack_rbcd(&digits)?,
            };
            Ok((body, digits.len()))
        }
    }
}

/// Encode one field to its wire payload.
pub fn encode_field(
    index: usize,
    def: &FieldDefinition,
    value: &FieldValue,
) -> Iso8583Result<Vec<u8>> {
    let (body, logical_len) = match (&def.sub_fields, value) {
        (Some(subs), FieldValue::Composite(children)) => {
            if subs.len() != children.len() {
                return Err(Iso8583Error::InvalidData(format!(
                    "field {} expects {} sub-values, got {}",
                    index,
                    subs.len(),
                    children.len()
                )));
            }
            let mut body = Vec::new();
            for (sub_def, child) in subs.iter().zip(children) {
                // sub-fields are Fixed only in this codec
                if sub_def.kind != FieldKind::Fixed {
                    return Err(Iso8583Error::InvalidEncoder);
                }
                body.extend_from_slice(&encode_field(index, sub_def, child)?);
            }
            let len = body.len();
            (body, len)
        }
        (Some(_), FieldValue::Scalar(_)) => {
            return Err(Iso8583Error::InvalidData(format!(
                "field {} is composite but a scalar value was supplied",
                index
            )));
        }
        (None, FieldValue::Composite(_)) => {
            return Err(Iso8583Error::InvalidData(format!(
                "field {} is scalar but a composite value was supplied",
                index
            )));
        }
        (None, FieldValue::Scalar(s)) => encode_scalar(index, def, s)?,
    };

    if def.kind == FieldKind::Fixed {
        return Ok(body);
    }
    if logical_len > def.kind.max_length() {
        return Err(Iso8583Error::ValueTooLong {
            field: index,
            declared: def.kind.max_length(),
            actual: logical_len,
        });
    }
    let mut out = length::encode_length(def.kind, logical_len)?;
    out.extend_from_slice(&body);
    Ok(out)
}

/// Number of body bytes occupied by a payload of logical length `len`.
fn body_size(encoding: ByteEncoding, len: usize) -> usize {
    match encoding {
        ByteEncoding::Bcd | ByteEncoding::RBcd => len.div_ceil(2),
        ByteEncoding::Ascii | ByteEncoding::Binary => len,
    }
}

/// Decode one field from the head of `raw`, returning the value and the
/// number of bytes consumed (header plus body).
pub fn decode_field(
    index: usize,
    def: &FieldDefinition,
    raw: &[u8],
) -> Iso8583Result<(FieldValue, usize)> {
    let (len, header) = match def.kind {
        FieldKind::Fixed => (def.length, 0),
        kind => length::decode_length(kind, raw)?,
    };

    if let Some(subs) = &def.sub_fields {
        // The outer length of a composite counts encoded bytes.
        if raw.len() < header + len {
            return Err(Iso8583Error::TruncatedMessage {
                needed: header + len,
                available: raw.len(),
            });
        }
        let body = &raw[header..header + len];
        let mut children = Vec::with_capacity(subs.len());
        let mut cursor = 0;
        for sub_def in subs {
            if sub_def.kind != FieldKind::Fixed {
                return Err(Iso8583Error::InvalidEncoder);
            }
            let (child, used) = decode_field(index, sub_def, &body[cursor..])?;
            children.push(child);
            cursor += used;
        }
        if cursor != len {
            return Err(Iso8583Error::ParseLengthFailed(format!(
                "composite field {} body leaves {} bytes undecoded",
                index,
                len - cursor
            )));
        }
        return Ok((FieldValue::Composite(children), header + len));
    }

    let size = body_size(def.encoding, len);
    if raw.len() < header + size {
        return Err(Iso8583Error::TruncatedMessage {
            needed: header + size,
            available: raw.len(),
        });
    }
    let body = &raw[header..header + size];
    let value = match def.encoding {
        ByteEncoding::Ascii => {
            if !body.is_ascii() {
                return Err(Iso8583Error::InvalidData(format!(
                    "field {} text body contains non-ASCII bytes",
                    index
                )));
            }
            String::from_utf8(body.to_vec())
                .map_err(|e| Iso8583Error::InvalidData(e.to_string()))?
        }
        ByteEncoding::Binary => hex::encode_upper(body),
        ByteEncoding::Bcd => bcd::unpack_lbcd(body, len)?,
        ByteEncoding::RBcd => bcd::unpack_rbcd(body, len)?,
    };
    Ok((FieldValue::Scalar(value), header + size))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(s: &str) -> FieldValue {
        FieldValue::Scalar(s.to_string())
    }

    #[test]
    fn test_fixed_bcd_zero_pads_to_declared_width() {
        let def = FieldDefinition::fixed(ByteEncoding::Bcd, 12);
        let bytes = encode_field(4, &def, &scalar("1")).unwrap();
        assert_eq!(bytes, vec![0x00, 0x00, 0x00, 0x00, 0x00, 0x01]);
        let (value, used) = decode_field(4, &def, &bytes).unwrap();
        assert_eq!(value, scalar("000000000001"));
        assert_eq!(used, 6);
    }

    #[test]
    fn test_var1_bcd_header_and_body() {
        let def = FieldDefinition::var(FieldKind::Var1, ByteEncoding::Bcd);
        let bytes = encode_field(2, &def, &scalar("31")).unwrap();
        assert_eq!(bytes, vec![0x02, 0x31]);
        let (value, used) = decode_field(2, &def, &bytes).unwrap();
        assert_eq!(value, scalar("31"));
        assert_eq!(used, 2);
    }

    #[test]
    fn test_var_bcd_odd_digit_count() {
        let def = FieldDefinition::var(FieldKind::Var1, ByteEncoding::Bcd);
        let bytes = encode_field(2, &def, &scalar("12345")).unwrap();
        assert_eq!(bytes, vec![0x05, 0x12, 0x34, 0x50]);
        let (value, used) = decode_field(2, &def, &bytes).unwrap();
        assert_eq!(value, scalar("12345"));
        assert_eq!(used, 4);
    }

    #[test]
    fn test_fixed_rbcd_odd_width() {
        let def = FieldDefinition::fixed(ByteEncoding::RBcd, 3);
        let bytes = encode_field(23, &def, &scalar("001")).unwrap();
        assert_eq!(bytes, vec![0x00, 0x01]);
        let (value, _) = decode_field(23, &def, &bytes).unwrap();
        assert_eq!(value, scalar("001"));
    }

    #[test]
    fn test_rbcd_leading_zero_carve_out() {
        // One digit over the declared width with a leading zero is truncated
        // by dropping that zero, so odd-length reverse-packed values round-trip.
        let def = FieldDefinition::fixed(ByteEncoding::RBcd, 3);
        let bytes = encode_field(23, &def, &scalar("0123")).unwrap();
        assert_eq!(bytes, encode_field(23, &def, &scalar("123")).unwrap());
        // Without the leading zero the overflow is still an error.
        assert!(matches!(
            encode_field(23, &def, &scalar("1234")),
            Err(Iso8583Error::ValueTooLong { field: 23, declared: 3, actual: 4 })
        ));
    }

    #[test]
    fn test_value_too_long() {
        let def = FieldDefinition::fixed(ByteEncoding::Bcd, 4);
        assert!(matches!(
            encode_field(13, &def, &scalar("12345")),
            Err(Iso8583Error::ValueTooLong { field: 13, declared: 4, actual: 5 })
        ));
    }

    #[test]
    fn test_fixed_ascii_space_padding() {
        let def = FieldDefinition::fixed(ByteEncoding::Ascii, 8);
        let bytes = encode_field(41, &def, &scalar("00003042")).unwrap();
        assert_eq!(bytes, b"00003042");
        let short = encode_field(41, &def, &scalar("ABC")).unwrap();
        assert_eq!(short, b"ABC     ");
    }

    #[test]
    fn test_binary_field_hex_round_trip() {
        let def = FieldDefinition::fixed(ByteEncoding::Binary, 8);
        let bytes = encode_field(52, &def, &scalar("0123456789ABCDEF")).unwrap();
        assert_eq!(bytes, vec![0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF]);
        let (value, used) = decode_field(52, &def, &bytes).unwrap();
        assert_eq!(value, scalar("0123456789ABCDEF"));
        assert_eq!(used, 8);
    }

    #[test]
    fn test_binary_rejects_non_hex() {
        let def = FieldDefinition::var(FieldKind::Var2, ByteEncoding::Binary);
        assert!(matches!(
            encode_field(62, &def, &scalar("XYZ1")),
            Err(Iso8583Error::InvalidHex(_))
        ));
    }

    #[test]
    fn test_truncated_body_is_never_partial() {
        let def = FieldDefinition::fixed(ByteEncoding::Bcd, 12);
        let bytes = encode_field(4, &def, &scalar("1")).unwrap();
        assert!(matches!(
            decode_field(4, &def, &bytes[..5]),
            Err(Iso8583Error::TruncatedMessage { needed: 6, available: 5 })
        ));
    }

    #[test]
    fn test_composite_round_trip() {
        // Field 60 layout: 2+6+3+1+1 digits packed independently is 8 bytes.
        let def = FieldDefinition::composite(
            FieldKind::Var2,
            ByteEncoding::Bcd,
            vec![
                FieldDefinition::fixed(ByteEncoding::Bcd, 2),
                FieldDefinition::fixed(ByteEncoding::Bcd, 6),
                FieldDefinition::fixed(ByteEncoding::Bcd, 3),
                FieldDefinition::fixed(ByteEncoding::Bcd, 1),
                FieldDefinition::fixed(ByteEncoding::Bcd, 1),
            ],
        );
        let value = FieldValue::Composite(vec![
            scalar("00"),
            scalar("000001"),
            scalar("003"),
            scalar("0"),
            scalar("0"),
        ]);
        let bytes = encode_field(60, &def, &value).unwrap();
        assert_eq!(bytes[..2], [0x00, 0x08]);
        assert_eq!(bytes.len(), 10);
        let (decoded, used) = decode_field(60, &def, &bytes).unwrap();
        assert_eq!(decoded, value);
        assert_eq!(used, 10);
    }

    #[test]
    fn test_composite_sub_value_count_mismatch() {
        let def = FieldDefinition::composite(
            FieldKind::Var2,
            ByteEncoding::Bcd,
            vec![FieldDefinition::fixed(ByteEncoding::Bcd, 3)],
        );
        let value = FieldValue::Composite(vec![scalar("1"), scalar("2")]);
        assert!(matches!(
            encode_field(63, &def, &value),
            Err(Iso8583Error::InvalidData(_))
        ));
    }

    #[test]
    fn test_variable_sub_field_is_unsupported() {
        let def = FieldDefinition::composite(
            FieldKind::Var2,
            ByteEncoding::Bcd,
            vec![FieldDefinition::var(FieldKind::Var1, ByteEncoding::Bcd)],
        );
        let value = FieldValue::Composite(vec![scalar("12")]);
        assert!(matches!(
            encode_field(60, &def, &value),
            Err(Iso8583Error::InvalidEncoder)
        ));
    }

    #[test]
    fn test_ascii_decode_rejects_non_ascii() {
        let def = FieldDefinition::fixed(ByteEncoding::Ascii, 2);
        assert!(matches!(
            decode_field(39, &def, &[0xFF, 0x30]),
            Err(Iso8583Error::InvalidData(_))
        ));
    }
}
