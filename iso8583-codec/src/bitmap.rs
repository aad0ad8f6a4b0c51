//! Presence bitmap codec
//!
//! Bit `i` (1-based) lives at byte `(i-1)/8`, counting bit positions from
//! the most significant bit. Bit 1 is never a data field: it signals that a
//! secondary bitmap (bytes 8..16) follows, which happens exactly when some
//! populated index exceeds 64.

use iso8583_core::{Iso8583Error, Iso8583Result};

/// Build the presence bitmap for the given populated field indices.
///
/// Produces 8 bytes, or 16 with bit 1 forced on when any index exceeds 64.
/// Index 1 itself is never independently settable and is ignored if present.
pub fn build(indices: &[usize]) -> Vec<u8> {
    let secondary = indices.iter().any(|&i| i > 64);
    let mut bitmap = vec![0u8; if secondary { 16 } else { 8 }];
    if secondary {
        bitmap[0] |= 0x80;
    }
    for &i in indices {
        if i <= 1 || i > bitmap.len() * 8 {
            continue;
        }
        bitmap[(i - 1) / 8] |= 0x01 << (7 - ((i - 1) % 8));
    }
    bitmap
}

/// Parse a bitmap, returning whether the secondary extension was present
/// and the populated field indices in ascending order (index 1 excluded).
pub fn parse(raw: &[u8]) -> Iso8583Result<(bool, Vec<usize>)> {
    if raw.is_empty() {
        return Err(Iso8583Error::TruncatedMessage {
            needed: 8,
            available: 0,
        });
    }
    let secondary = raw[0] & 0x80 == 0x80;
    let byte_count = if secondary { 16 } else { 8 };
    if raw.len() < byte_count {
        return Err(Iso8583Error::TruncatedMessage {
            needed: byte_count,
            available: raw.len(),
        });
    }
    let mut indices = Vec::new();
    for byte_index in 0..byte_count {
        for bit_index in 0..8 {
            if raw[byte_index] & (0x01 << (7 - bit_index)) == 0 {
                continue;
            }
            let i = byte_index * 8 + bit_index + 1;
            if i == 1 {
                // field 1 is the secondary-bitmap indicator
                continue;
            }
            indices.push(i);
        }
    }
    Ok((secondary, indices))
}
