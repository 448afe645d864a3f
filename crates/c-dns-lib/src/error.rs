use thiserror::Error;

pub type Result<T> = std::result::Result<T, WireError>;

/// Errors produced while encoding or decoding DNS messages.
///
/// Any of these aborts the whole message: a packet is either fully decoded or rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("end of buffer: need {needed} byte(s) at position {pos}, buffer holds {len}")]
    BufferUnderflow { pos: usize, needed: usize, len: usize },

    #[error("buffer overflow: can't write {needed} byte(s) at position {pos}, capacity is {capacity}")]
    BufferOverflow { pos: usize, needed: usize, capacity: usize },

    #[error("invalid seek to position {pos}, capacity is {capacity}")]
    InvalidSeek { pos: usize, capacity: usize },

    #[error("label is too long ({len}): {label}")]
    LabelTooLong { len: usize, label: String },

    #[error("too many compression jumps while reading QNAME (limit is {limit})")]
    TooManyJumps { limit: usize },

    #[error("malformed packet: QNAME is longer than {limit} bytes")]
    NameTooLong { limit: usize },

    #[error("RDATA of length {rd_length} exceeds the {remaining} remaining byte(s)")]
    RdataOverflow { rd_length: usize, remaining: usize },
}
