//! Litchi CFB - A Rust library for reading Compound File Binary containers
//!
//! Compound File Binary (CFB, also known as OLE2 structured storage) is the
//! container behind legacy Microsoft Office files (.doc, .xls, .ppt) and
//! embedded OLE objects. This crate reconstructs the logical streams of such
//! a container from its raw bytes.
//!
//! # Features
//!
//! - **Header parsing**: Version 3 (512-byte sectors) and version 4 (4096-byte sectors)
//! - **FAT and MiniFAT**: Full DIFAT support, mini stream addressing for small streams
//! - **Strict mode**: Any structural problem is an error, no partial results
//! - **Lenient mode**: Damaged chains are zero-filled and reported as structured warnings
//! - **Parallel reads**: Independent streams can be assembled concurrently (`parallel` feature)
//!
//! # Example - Strict reading
//!
//! ```no_run
//! use litchi_cfb::ole::{CompoundFile, ReadOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfb = CompoundFile::from_path("document.doc")?;
//!
//! for sid in 1..cfb.directory_entry_count() as u32 {
//!     let data = cfb.read_entry(sid, &mut ReadOptions::strict())?;
//!     println!("Entry {}: {} bytes", sid, data.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Best-effort reading of a damaged file
//!
//! ```no_run
//! use litchi_cfb::ole::{CompoundFile, ReadOptions, Warning};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bytes = std::fs::read("damaged.xls")?;
//!
//! let mut warnings: Vec<Warning> = Vec::new();
//! let mut sink = |w: &Warning| warnings.push(w.clone());
//! let mut options = ReadOptions::lenient(&mut sink);
//!
//! let cfb = CompoundFile::open_with(bytes, &mut options)?;
//! let workbook = cfb.read_entry(1, &mut options)?;
//! drop(options);
//!
//! println!("Recovered {} bytes with {} warnings", workbook.len(), warnings.len());
//! for warning in &warnings {
//!     println!("  {}", warning);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Low-level stream assembly
//!
//! ```
//! use litchi_cfb::ole::{read_stream_from_fat, Header, ReadOptions, ENDOFCHAIN};
//!
//! # fn demo(bytes: &[u8]) -> litchi_cfb::ole::Result<()> {
//! let header = Header::parse(bytes)?;
//! let fat = litchi_cfb::ole::load_fat(bytes, &header)?;
//! let data = read_stream_from_fat(bytes, &header, &fat, 0, 600, &mut ReadOptions::strict())?;
//! assert_eq!(data.len(), 600);
//! # let _ = ENDOFCHAIN;
//! # Ok(())
//! # }
//! ```

/// Shared binary utilities
pub mod common;

/// Compound File Binary (OLE2) container reader
///
/// This module provides header parsing, allocation table loading, chain
/// walking and stream assembly for compound files.
pub mod ole;

// Re-export commonly used types for convenience
pub use ole::{CfbError, CompoundFile, ReadOptions, StreamLocator, Warning, WarningCode};
