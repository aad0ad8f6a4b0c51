//! Packed binary-coded-decimal digit codec
//!
//! Two layouts are used on the wire. Left-packed ("lbcd") places the first
//! digit in the high nibble and pads an odd digit count with a trailing zero
//! nibble. Right-packed ("rbcd") pads an odd digit count with a leading zero
//! nibble instead, so the first digit lands in the low nibble of byte 0.
//! Unpacking needs the logical digit count to strip the pad nibble from the
//! correct side.

use iso8583_core::{Iso8583Error, Iso8583Result};

fn digit_value(c: char) -> Iso8583Result<u8> {
    c.to_digit(10)
        .map(|d| d as u8)
        .ok_or_else(|| Iso8583Error::InvalidData(format!("non-decimal digit {:?}", c)))
}

fn pack_pairs(digits: &str) -> Iso8583Result<Vec<u8>> {
    let mut out = Vec::with_capacity(digits.len() / 2);
    let mut chars = digits.chars();
    while let (Some(hi), Some(lo)) = (chars.next(), chars.next()) {
        out.push((digit_value(hi)? << 4) | digit_value(lo)?);
    }
    Ok(out)
}

/// Pack decimal digits two per byte, first digit in the high nibble.
/// An odd digit count is padded with a trailing zero nibble.
pub fn pack_lbcd(digits: &str) -> Iso8583Result<Vec<u8>> {
    if digits.len() % 2 == 0 {
        pack_pairs(digits)
    } else {
        let mut padded = String::with_capacity(digits.len() + 1);
        padded.push_str(digits);
        padded.push('0');
        pack_pairs(&padded)
    }
}

/// Pack decimal digits two per byte, padding an odd digit count with a
/// leading zero nibble so the first digit occupies the low nibble of byte 0.
pub fn pack_rbcd(digits: &str) -> Iso8583Result<Vec<u8>> {
    if digits.len() % 2 == 0 {
        pack_pairs(digits)
    } else {
        let mut padded = String::with_capacity(digits.len() + 1);
        padded.push('0');
        padded.push_str(digits);
        pack_pairs(&padded)
    }
}

fn nibble_digit(nibble: u8) -> Iso8583Result<char> {
    if nibble > 9 {
        return Err(Iso8583Error::BadBcdDigit(nibble));
    }
    Ok((b'0' + nibble) as char)
}

fn unpack(bytes: &[u8], digit_count: usize, skip_leading: bool) -> Iso8583Result<String> {
    let needed = digit_count.div_ceil(2);
    if bytes.len() < needed {
        return Err(Iso8583Error::TruncatedMessage {
            needed,
            available: bytes.len(),
        });
    }
    // Skip the pad nibble: leading for rbcd, trailing for lbcd.
    let offset = if skip_leading && digit_count % 2 == 1 { 1 } else { 0 };
    let mut out = String::with_capacity(digit_count);
    for pos in offset..offset + digit_count {
        let byte = bytes[pos / 2];
        let nibble = if pos % 2 == 0 { byte >> 4 } else { byte & 0x0F };
        out.push(nibble_digit(nibble)?);
    }
    Ok(out)
}

/// Reconstruct exactly `digit_count` digits from left-packed bytes.
pub fn unpack_lbcd(bytes: &[u8], digit_count: usize) -> Iso8583Result<String> {
    unpack(bytes, digit_count, false)
}

/// Reconstruct exactly `digit_count` digits from right-packed bytes,
/// stripping the implicit leading zero nibble of an odd count.
pub fn unpack_rbcd(bytes: &[u8], digit_count: usize) -> Iso8583Result<String> {
    unpack(bytes, digit_count, true)
}
