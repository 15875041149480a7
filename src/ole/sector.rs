//! Sector access
//!
//! Sector `n` starts right after the header region, at
//! `header_region + n * sector_size`. This module is the only place that
//! checks a sector window against the physical container length; whether
//! an out-of-range sector is fatal is decided by the caller.

use super::header::Header;
use thiserror::Error;

/// A sector whose byte window does not fit inside the container.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Sector {sector} spans bytes {offset}..{end}, container holds {available} bytes")]
pub struct OutOfRange {
    pub sector: u32,
    pub offset: u64,
    pub end: u64,
    pub available: u64,
}

/// Source of fixed-size sectors.
///
/// Implemented for raw container bytes. Stream assembly is generic over this
/// trait so that a caller can observe or redirect sector reads.
pub trait SectorSource {
    /// Return the exact byte window of `sector`.
    fn read_sector(&self, header: &Header, sector: u32) -> Result<&[u8], OutOfRange>;

    /// Total container length in bytes, header included.
    fn byte_len(&self) -> usize;

    /// Number of whole sectors stored after the header region.
    fn sector_count(&self, header: &Header) -> usize {
        self.byte_len().saturating_sub(header.header_region_size()) / header.sector_size
    }
}

impl SectorSource for [u8] {
    fn read_sector(&self, header: &Header, sector: u32) -> Result<&[u8], OutOfRange> {
        read_sector(self, header, sector)
    }

    fn byte_len(&self) -> usize {
        self.len()
    }
}

impl SectorSource for Vec<u8> {
    fn read_sector(&self, header: &Header, sector: u32) -> Result<&[u8], OutOfRange> {
        read_sector(self, header, sector)
    }

    fn byte_len(&self) -> usize {
        self.len()
    }
}

impl SectorSource for bytes::Bytes {
    fn read_sector(&self, header: &Header, sector: u32) -> Result<&[u8], OutOfRange> {
        read_sector(self, header, sector)
    }

    fn byte_len(&self) -> usize {
        self.len()
    }
}

/// Read a single sector from the container bytes.
///
/// # Arguments
///
/// * `data` - The whole container, header included
/// * `header` - Parsed header supplying the sector size
/// * `sector` - Sector number (0 is the first sector after the header)
///
/// # Returns
///
/// * `Result<&[u8], OutOfRange>` - A `sector_size` window into `data`
pub fn read_sector<'d>(data: &'d [u8], header: &Header, sector: u32) -> Result<&'d [u8], OutOfRange> {
    let sector_size = header.sector_size as u64;
    let available = data.len() as u64;

    // u32 sector ids times at most 4096 bytes always fit in u64
    let offset = header.header_region_size() as u64 + u64::from(sector) * sector_size;
    let end = offset + sector_size;

    let out_of_range = OutOfRange {
        sector,
        offset,
        end,
        available,
    };
    if end > available {
        return Err(out_of_range);
    }

    let start = usize::try_from(offset).map_err(|_| out_of_range)?;
    let stop = usize::try_from(end).map_err(|_| out_of_range)?;
    Ok(&data[start..stop])
}
