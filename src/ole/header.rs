//! Compound file header parsing
//!
//! The first 512 bytes of a container describe its geometry: sector sizes,
//! where the directory and MiniFAT chains start, and the first 109 FAT
//! sector ids (the header DIFAT). Everything else in the container is
//! located through these fields.

use super::consts::*;
use super::error::{CfbError, Result};
use log::debug;
use zerocopy::{FromBytes, LE, U16, U32};
use zerocopy_derive::FromBytes as DeriveFromBytes;

/// Raw header structure (512 bytes)
///
/// This represents the on-disk format of the header.
#[derive(Debug, Clone, DeriveFromBytes)]
#[repr(C)]
#[allow(dead_code)]
struct RawHeader {
    /// Signature, must equal [`MAGIC`]
    magic: [u8; 8],
    /// Reserved class id (zero)
    clsid: [u8; 16],
    minor_version: U16<LE>,
    major_version: U16<LE>,
    /// Must be 0xFFFE
    byte_order: U16<LE>,
    /// log2 of the sector size
    sector_shift: U16<LE>,
    /// log2 of the mini sector size
    mini_sector_shift: U16<LE>,
    reserved: [u8; 6],
    /// Directory sector count (always zero for version 3)
    num_dir_sectors: U32<LE>,
    num_fat_sectors: U32<LE>,
    first_dir_sector: U32<LE>,
    transaction_signature: U32<LE>,
    mini_stream_cutoff: U32<LE>,
    first_mini_fat_sector: U32<LE>,
    num_mini_fat_sectors: U32<LE>,
    first_difat_sector: U32<LE>,
    num_difat_sectors: U32<LE>,
    /// First 109 FAT sector ids
    difat: [U32<LE>; HEADER_DIFAT_ENTRIES],
}

/// Container-wide geometry.
///
/// Created once per opened container and shared read-only by every
/// sector, table and stream operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub minor_version: u16,
    /// 3 (512-byte sectors) or 4 (4096-byte sectors)
    pub major_version: u16,
    /// Sector size in bytes
    pub sector_size: usize,
    /// Mini sector size in bytes (typically 64)
    pub mini_sector_size: usize,
    pub num_dir_sectors: u32,
    pub num_fat_sectors: u32,
    /// First sector of the directory chain
    pub first_dir_sector: u32,
    /// Streams smaller than this many bytes live in the mini stream
    pub mini_stream_cutoff: u32,
    pub first_mini_fat_sector: u32,
    pub num_mini_fat_sectors: u32,
    pub first_difat_sector: u32,
    pub num_difat_sectors: u32,
    /// FAT sector ids stored in the header
    pub difat: [u32; HEADER_DIFAT_ENTRIES],
}

impl Header {
    /// Parse and validate the header at the start of `data`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let head = data.get(..HEADER_SIZE).ok_or(CfbError::NotOleFile)?;
        let raw = RawHeader::read_from_bytes(head)
            .map_err(|_| CfbError::InvalidHeader("Failed to parse header".to_string()))?;

        if &raw.magic != MAGIC {
            return Err(CfbError::NotOleFile);
        }

        if raw.byte_order.get() != BYTE_ORDER_LE {
            return Err(CfbError::InvalidHeader(format!(
                "Invalid byte order 0x{:04X}",
                raw.byte_order.get()
            )));
        }

        let major_version = raw.major_version.get();
        let sector_shift = raw.sector_shift.get();
        let mini_sector_shift = raw.mini_sector_shift.get();

        match (major_version, sector_shift) {
            (3, 9) | (4, 12) => {},
            (3 | 4, shift) => {
                return Err(CfbError::InvalidHeader(format!(
                    "Sector shift {} does not match version {}",
                    shift, major_version
                )));
            },
            (version, _) => {
                return Err(CfbError::InvalidHeader(format!(
                    "Unsupported major version {}",
                    version
                )));
            },
        }

        if mini_sector_shift == 0 || mini_sector_shift >= sector_shift {
            return Err(CfbError::InvalidHeader(format!(
                "Mini sector shift {} is not below sector shift {}",
                mini_sector_shift, sector_shift
            )));
        }

        let header = Header {
            minor_version: raw.minor_version.get(),
            major_version,
            sector_size: 1usize << sector_shift,
            mini_sector_size: 1usize << mini_sector_shift,
            num_dir_sectors: raw.num_dir_sectors.get(),
            num_fat_sectors: raw.num_fat_sectors.get(),
            first_dir_sector: raw.first_dir_sector.get(),
            mini_stream_cutoff: raw.mini_stream_cutoff.get(),
            first_mini_fat_sector: raw.first_mini_fat_sector.get(),
            num_mini_fat_sectors: raw.num_mini_fat_sectors.get(),
            first_difat_sector: raw.first_difat_sector.get(),
            num_difat_sectors: raw.num_difat_sectors.get(),
            difat: raw.difat.map(|v| v.get()),
        };

        debug!(
            "CFB v{}: sector {} bytes, mini sector {} bytes, {} FAT sectors, directory at {}",
            header.major_version,
            header.sector_size,
            header.mini_sector_size,
            header.num_fat_sectors,
            header.first_dir_sector
        );

        Ok(header)
    }

    /// Size of the header region preceding sector 0.
    ///
    /// The header occupies one full sector, padded for 4096-byte sectors.
    #[inline]
    pub fn header_region_size(&self) -> usize {
        self.sector_size
    }

    /// Number of u32 entries in one FAT or DIFAT sector.
    #[inline]
    pub fn entries_per_sector(&self) -> usize {
        self.sector_size / 4
    }

    /// FAT sector ids listed in the header, up to the first unused slot.
    pub fn header_fat_sectors(&self) -> impl Iterator<Item = u32> + '_ {
        self.difat
            .iter()
            .copied()
            .take_while(|&sector| sector != FREESECT && sector != ENDOFCHAIN)
    }
}

/// Check if a file/data is an OLE file by checking magic bytes
pub fn is_ole_file(data: &[u8]) -> bool {
    data.len() >= MINIMAL_OLEFILE_SIZE && &data[0..8] == MAGIC
}
