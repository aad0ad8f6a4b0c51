//! Message assembler and disassembler
//!
//! Wire layout: `[TPDU: 5 BCD bytes][protocol header: 6 BCD bytes,
//! optional][MTI: 2 BCD bytes][bitmap: 8 or 16 bytes][field payloads in
//! ascending index order]`, optionally wrapped by a 2-byte big-endian total
//! length prefix. Fields are processed in strictly ascending numeric order
//! on both sides so bitmap bit order and payload byte order stay in
//! lock-step.

use crate::bcd;
use crate::bitmap;
use crate::field;
use iso8583_core::{FieldTable, Iso8583Error, Iso8583Result, Message};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// TPDU width in decimal digits.
pub const TPDU_DIGITS: usize = 10;
/// Protocol header width in decimal digits.
pub const HEADER_DIGITS: usize = 12;
/// MTI width in decimal digits.
pub const MTI_DIGITS: usize = 4;

fn panic_text(cause: Box<dyn Any + Send>) -> String {
    if let Some(s) = cause.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = cause.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown internal fault".to_string()
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// Message codec bound to a field-definition table.
///
/// The table is the wire protocol's dialect; it is read-only and may be
/// shared by reference across threads.
pub struct MessageCodec<'a> {
    table: &'a FieldTable,
}

impl<'a> MessageCodec<'a> {
    /// Create a codec over the given field table.
    pub fn new(table: &'a FieldTable) -> Self {
        Self { table }
    }

    /// Serialize a full message: TPDU, optional protocol header, then the
    /// field part.
    ///
    /// Any unexpected internal fault is folded into `InternalCodec` at this
    /// boundary instead of aborting the process.
    pub fn encode(&self, msg: &Message) -> Iso8583Result<Vec<u8>> {
        catch_unwind(AssertUnwindSafe(|| self.encode_inner(msg)))
            .unwrap_or_else(|cause| Err(Iso8583Error::InternalCodec(panic_text(cause))))
    }

    /// Serialize the field part only: MTI, bitmap, then per-field payloads
    /// in ascending index order. This is the buffer the retail MAC
    /// authenticates and the secure envelope encrypts.
    pub fn encode_fields(&self, msg: &Message) -> Iso8583Result<Vec<u8>> {
        catch_unwind(AssertUnwindSafe(|| self.encode_fields_inner(msg)))
            .unwrap_or_else(|cause| Err(Iso8583Error::InternalCodec(panic_text(cause))))
    }

    /// Serialize a full message behind a 2-byte big-endian total-length
    /// prefix, the framing used on the TCP link.
    pub fn encode_with_length_prefix(&self, msg: &Message) -> Iso8583Result<Vec<u8>> {
        let data = self.encode(msg)?;
        if data.len() > u16::MAX as usize {
            return Err(Iso8583Error::InvalidData(format!(
                "message of {} bytes does not fit a 2-byte length prefix",
                data.len()
            )));
        }
        let mut out = Vec::with_capacity(2 + data.len());
        out.extend_from_slice(&(data.len() as u16).to_be_bytes());
        out.extend_from_slice(&data);
        Ok(out)
    }

    /// Parse a raw buffer back into a structured message.
    ///
    /// Either a fully valid message is returned or a specific error; a
    /// failure partway through a field aborts the whole decode.
    pub fn decode(&self, raw: &[u8]) -> Iso8583Result<Message> {
        catch_unwind(AssertUnwindSafe(|| self.decode_inner(raw)))
            .unwrap_or_else(|cause| Err(Iso8583Error::InternalCodec(panic_text(cause))))
    }

    fn encode_inner(&self, msg: &Message) -> Iso8583Result<Vec<u8>> {
        let mut out = Vec::with_capacity(512);
        out.extend_from_slice(&encode_tpdu(&msg.tpdu)?);
        if let Some(header) = &msg.header {
            out.extend_from_slice(&encode_header(header)?);
        }
        out.extend_from_slice(&self.encode_fields_inner(msg)?);
        Ok(out)
    }

    fn encode_fields_inner(&self, msg: &Message) -> Iso8583Result<Vec<u8>> {
        if msg.mti.len() != MTI_DIGITS || !is_digits(&msg.mti) {
            return Err(Iso8583Error::InvalidMti(msg.mti.clone()));
        }
        let mut out = bcd::pack_lbcd(&msg.mti)?;

        let indices: Vec<usize> = msg.fields.keys().copied().collect();
        for &i in &indices {
            if i == 1 || !self.table.contains_key(&i) {
                return Err(Iso8583Error::UndefinedField(i));
            }
        }
        out.extend_from_slice(&bitmap::build(&indices));

        // BTreeMap iteration is already in ascending index order.
        for (&i, value) in &msg.fields {
            let def = &self.table[&i];
            out.extend_from_slice(&field::encode_field(i, def, value)?);
        }
        Ok(out)
    }

    fn decode_inner(&self, raw: &[u8]) -> Iso8583Result<Message> {
        let tpdu = take_digits(raw, 0, TPDU_DIGITS)?;
        let header = take_digits(raw, TPDU_DIGITS / 2, HEADER_DIGITS)?;
        let mti_offset = (TPDU_DIGITS + HEADER_DIGITS) / 2;
        let mti = take_digits(raw, mti_offset, MTI_DIGITS)?;

        let mut cursor = mti_offset + MTI_DIGITS / 2;
        let (has_secondary, indices) = bitmap::parse(&raw[cursor..])?;
        cursor += if has_secondary { 16 } else { 8 };

        let mut msg = Message {
            tpdu,
            header: Some(header),
            mti,
            has_secondary_bitmap: has_secondary,
            fields: Default::default(),
        };
        for i in indices {
            let def = self
                .table
                .get(&i)
                .ok_or(Iso8583Error::UndefinedField(i))?;
            let (value, used) =
                field::decode_field(i, def, &raw[cursor..]).map_err(|e| e.in_field(i))?;
            msg.fields.insert(i, value);
            cursor += used;
        }
        Ok(msg)
    }
}

fn encode_tpdu(tpdu: &str) -> Iso8583Result<Vec<u8>> {
    if tpdu.is_empty() {
        return Err(Iso8583Error::InvalidTpdu("tpdu is required".to_string()));
    }
    if tpdu.len() != TPDU_DIGITS || !is_digits(tpdu) {
        return Err(Iso8583Error::InvalidTpdu(tpdu.to_string()));
    }
    bcd::pack_lbcd(tpdu)
}

fn encode_header(header: &str) -> Iso8583Result<Vec<u8>> {
    if header.len() != HEADER_DIGITS || !is_digits(header) {
        return Err(Iso8583Error::InvalidHeader(header.to_string()));
    }
    bcd::pack_lbcd(header)
}

/// Read `digit_count` BCD digits starting at byte `offset`.
fn take_digits(raw: &[u8], offset: usize, digit_count: usize) -> Iso8583Result<String> {
    let size = digit_count / 2;
    if raw.len() < offset + size {
        return Err(Iso8583Error::TruncatedMessage {
            needed: offset + size,
            available: raw.len(),
        });
    }
    bcd::unpack_lbcd(&raw[offset..offset + size], digit_count)
}
