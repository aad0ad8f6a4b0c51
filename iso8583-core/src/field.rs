//! Field and message data model for the ISO 8583 POS protocol

use std::collections::BTreeMap;
use std::fmt;

/// Structural kind of a field: fixed width, or variable with a BCD length header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Payload length is exactly the declared length.
    Fixed,
    /// LLVAR: 1-byte BCD length header, up to 99.
    Var1,
    /// LLLVAR: 2-byte BCD length header, up to 999.
    Var2,
    /// LLLLVAR: 2-byte BCD length header with plain digit-pair packing, up to 9999.
    Var2Wide,
}

impl FieldKind {
    /// Size in bytes of the length header preceding the payload.
    pub fn header_size(&self) -> usize {
        match self {
            FieldKind::Fixed => 0,
            FieldKind::Var1 => 1,
            FieldKind::Var2 | FieldKind::Var2Wide => 2,
        }
    }

    /// Largest length value the header can carry.
    pub fn max_length(&self) -> usize {
        match self {
            FieldKind::Fixed => usize::MAX,
            FieldKind::Var1 => 99,
            FieldKind::Var2 => 999,
            FieldKind::Var2Wide => 9999,
        }
    }
}

/// Byte encoding of a field payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteEncoding {
    /// Value stored as raw text bytes.
    Ascii,
    /// Value is a hex-digit string, decoded to raw bytes 1:1.
    Binary,
    /// Left-packed decimal: first digit in the high nibble.
    Bcd,
    /// Right-packed decimal: an odd digit count fills whole bytes
    /// with an implicit leading zero nibble.
    RBcd,
}

/// Definition of one field slot in the protocol dialect.
///
/// A table mapping field index (2..128) to `FieldDefinition` is the wire
/// protocol's dialect and must be identical on both communicating peers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    pub kind: FieldKind,
    pub encoding: ByteEncoding,
    /// Declared length: digits for `Bcd`/`RBcd`, bytes for `Ascii`/`Binary`.
    /// Only meaningful for `Fixed` fields.
    pub length: usize,
    /// Ordered sub-field layout for composite fields (fields 60/61/63).
    /// Sub-fields are `Fixed` only.
    pub sub_fields: Option<Vec<FieldDefinition>>,
}

impl FieldDefinition {
    /// A fixed-width scalar field.
    pub fn fixed(encoding: ByteEncoding, length: usize) -> Self {
        Self {
            kind: FieldKind::Fixed,
            encoding,
            length,
            sub_fields: None,
        }
    }

    /// A variable-width scalar field.
    pub fn var(kind: FieldKind, encoding: ByteEncoding) -> Self {
        Self {
            kind,
            encoding,
            length: 0,
            sub_fields: None,
        }
    }

    /// A composite field packing the given fixed sub-fields behind one
    /// outer length header.
    pub fn composite(kind: FieldKind, encoding: ByteEncoding, sub_fields: Vec<FieldDefinition>) -> Self {
        Self {
            kind,
            encoding,
            length: 0,
            sub_fields: Some(sub_fields),
        }
    }
}

/// Value of one populated field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Decimal/text/hex string payload, interpreted per the field's encoding.
    Scalar(String),
    /// Ordered child values of a composite field.
    Composite(Vec<FieldValue>),
}

impl FieldValue {
    /// The scalar payload, if this is a scalar value.
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            FieldValue::Scalar(s) => Some(s.as_str()),
            FieldValue::Composite(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Scalar(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Scalar(s)
    }
}

/// One transaction message.
///
/// Built once per transaction (mutable while fields are populated), then
/// serialized read-only. Field index 1 is never a data field (it is the
/// secondary-bitmap indicator); field 64 carries the MAC and is populated
/// last, after all other fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    /// Transport protocol data unit, 10 decimal digits.
    pub tpdu: String,
    /// Optional protocol header, 12 decimal digits.
    pub header: Option<String>,
    /// Message type indicator, 4 decimal digits.
    pub mti: String,
    /// Set on decode when the wire bitmap carried the secondary extension.
    pub has_secondary_bitmap: bool,
    /// Populated data fields by index (2..=128, excluding 1).
    pub fields: BTreeMap<usize, FieldValue>,
}

impl Message {
    /// Create an empty message with the given TPDU and MTI.
    pub fn new(tpdu: &str, mti: &str) -> Self {
        Self {
            tpdu: tpdu.to_string(),
            mti: mti.to_string(),
            ..Default::default()
        }
    }

    /// Populate a field slot.
    pub fn set_field(&mut self, index: usize, value: impl Into<FieldValue>) {
        self.fields.insert(index, value.into());
    }

    /// Look up a populated field.
    pub fn field(&self, index: usize) -> Option<&FieldValue> {
        self.fields.get(&index)
    }

    /// The scalar value of a populated field, if any.
    pub fn field_scalar(&self, index: usize) -> Option<&str> {
        self.fields.get(&index).and_then(FieldValue::as_scalar)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Scalar(s) => f.write_str(s),
            FieldValue::Composite(children) => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    write!(f, "{}", child)?;
                }
                Ok(())
            }
        }
    }
}

/// Human-readable dump of a decoded message, one line per populated slot.
impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "H000D: {}", self.tpdu)?;
        if let Some(header) = &self.header {
            writeln!(f, "H001D: {}", header)?;
        }
        writeln!(f, "F000D: {}", self.mti)?;
        for (index, value) in &self.fields {
            writeln!(f, "F{:03}D: {}", index, value)?;
        }
        Ok(())
    }
}
