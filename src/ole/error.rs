//! Error types for compound file reading.
use super::chain::ChainError;
use super::sector::OutOfRange;
use crate::common::binary::BinaryError;
use thiserror::Error;

/// Main error type for compound file operations.
///
/// Variants fall into three classes:
/// - unconditional failures, raised in both modes ([`CfbError::SizeNotRepresentable`],
///   [`CfbError::EmptyChain`], directory and header errors);
/// - recoverable conditions, raised only in strict mode (see [`CfbError::is_recoverable`]);
/// - caller configuration errors ([`CfbError::MissingWarningSink`]).
#[derive(Error, Debug)]
pub enum CfbError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Input does not start with a compound file header
    #[error("Not an OLE file")]
    NotOleFile,

    /// Header is present but its geometry is unusable
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// A fixed-width field could not be decoded
    #[error("Invalid data: {0}")]
    Binary(#[from] BinaryError),

    /// Declared stream size exceeds 2^53 - 1
    #[error("Declared stream size {size} is not representable")]
    SizeNotRepresentable { size: u64 },

    /// Non-zero declared size but the chain starts with ENDOFCHAIN
    #[error("Stream of {size} bytes has an empty allocation chain")]
    EmptyChain { size: u64 },

    /// The header has no directory sector
    #[error("Format error: container has no directory stream")]
    MissingDirectory,

    /// The directory chain yielded no sectors
    #[error("Format error: directory stream chain is empty")]
    EmptyDirectory,

    /// Allocation chain could not be walked
    #[error("Invalid allocation chain: {0}")]
    Chain(#[from] ChainError),

    /// Chain holds fewer sectors than the declared size needs
    #[error("Allocation chain too short: {chain} sectors, {required} required")]
    ChainTooShort { chain: usize, required: usize },

    /// Chain holds more sectors than the declared size needs
    #[error("Allocation chain length mismatch: {chain} sectors, {required} required")]
    ChainLengthMismatch { chain: usize, required: usize },

    /// A sector lies outside the container
    #[error(transparent)]
    SectorOutOfRange(#[from] OutOfRange),

    /// A mini sector lies outside the assembled mini stream
    #[error(
        "Mini sector {mini_sector} ends at byte {end}, mini stream holds {available} bytes"
    )]
    MiniStreamTruncated {
        mini_sector: u32,
        end: usize,
        available: usize,
    },

    /// Lenient mode was requested without somewhere to send warnings
    #[error("Lenient read in {operation} requires a warning sink")]
    MissingWarningSink { operation: &'static str },
}

impl CfbError {
    /// Whether lenient mode would have downgraded this error to a warning.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CfbError::Chain(_)
                | CfbError::ChainTooShort { .. }
                | CfbError::ChainLengthMismatch { .. }
                | CfbError::SectorOutOfRange(_)
                | CfbError::MiniStreamTruncated { .. }
        )
    }
}

/// Result type for compound file operations.
pub type Result<T> = std::result::Result<T, CfbError>;
