use thiserror::Error;

// Error
//------------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum QRError {
    // Planner
    #[error("Empty data")]
    EmptyData,
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Invalid character")]
    InvalidChar,
    #[error("Unsupported charset: {0}")]
    UnsupportedCharset(String),
    #[error("Invalid version")]
    InvalidVersion,
    #[error("Invalid masking pattern")]
    InvalidMaskingPattern,
    #[error("Capacity exceeded")]
    CapacityExceeded,

    // Galois field
    #[error("Division by zero in GF(256)")]
    DivisionByZero,
    #[error("Logarithm of zero is undefined in GF(256)")]
    FieldDomain,

    // Internal invariants
    #[error("Erasure pattern cannot be solved")]
    Unsolvable,
    #[error("Block and byte accounting mismatch")]
    InterleavingMismatch,
    #[error("Interleave mapping is not a permutation")]
    NotPermutation,

    // Image collaborator
    #[error("Target width {found} doesn't match symbol width {expected}")]
    TargetMismatch { expected: usize, found: usize },
}

pub type QRResult<T> = Result<T, QRError>;
