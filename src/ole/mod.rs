/// Constants for OLE file format
pub mod consts;

/// Error types
mod error;

/// Header parsing
mod header;

/// Sector access against the physical container
mod sector;

/// Allocation chain walking
mod chain;

/// FAT and MiniFAT loading
mod fat;

/// Strict/lenient recovery and warnings
mod recovery;

/// FAT and MiniFAT stream assembly, Directory Stream extraction
mod stream;

/// Container session over an in-memory compound file
mod file;

#[cfg(test)]
mod test_support;

// Re-export public types for convenient access
pub use chain::{ChainError, walk_fat_chain, walk_mini_fat_chain};
pub use consts::{DIFSECT, ENDOFCHAIN, FATSECT, FREESECT, MAXREGSECT};
pub use error::{CfbError, Result};
pub use fat::{load_fat, load_mini_fat};
pub use file::{CompoundFile, StreamLocator, StreamRead};
pub use header::{Header, is_ole_file};
pub use recovery::{Deviation, ReadOptions, Warning, WarningCode, WarningMeta};
pub use sector::{OutOfRange, SectorSource, read_sector};
pub use stream::{read_directory_stream_bytes, read_stream_from_fat, read_stream_from_mini_fat};
