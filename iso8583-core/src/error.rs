use thiserror::Error;

/// Main error type for ISO 8583 codec operations
#[derive(Error, Debug)]
pub enum Iso8583Error {
    #[error("Connection error: {0}")]
    Connection(#[from] std::io::Error),

    #[error("tpdu is invalid: {0}")]
    InvalidTpdu(String),

    #[error("header is invalid: {0}")]
    InvalidHeader(String),

    #[error("mti is invalid: {0}")]
    InvalidMti(String),

    #[error("field {field} value too long: declared {declared}, actual {actual}")]
    ValueTooLong {
        field: usize,
        declared: usize,
        actual: usize,
    },

    #[error("bad BCD digit nibble: 0x{0:X}")]
    BadBcdDigit(u8),

    #[error("failed to parse length header: {0}")]
    ParseLengthFailed(String),

    #[error("message truncated: need {needed} bytes, have {available}")]
    TruncatedMessage { needed: usize, available: usize },

    #[error("field {0} not defined")]
    UndefinedField(usize),

    #[error("unsupported field encoding")]
    InvalidEncoder,

    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid cipher key length: {0} bytes")]
    InvalidKeyLength(usize),

    #[error("field {0} is required but not populated")]
    MissingField(usize),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("field {index}: {source}")]
    Field {
        index: usize,
        source: Box<Iso8583Error>,
    },

    #[error("Critical error: {0}")]
    InternalCodec(String),
}

impl Iso8583Error {
    /// Annotate an error with the field index it occurred in.
    pub fn in_field(self, index: usize) -> Self {
        Iso8583Error::Field {
            index,
            source: Box::new(self),
        }
    }
}

/// Result type alias for ISO 8583 codec operations
pub type Iso8583Result<T> = Result<T, Iso8583Error>;
