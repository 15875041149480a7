//! Allocation table loading
//!
//! The FAT is spread over FAT sectors whose ids are listed in the DIFAT:
//! the first 109 ids live in the header, further ids in a chain of DIFAT
//! sectors. Each DIFAT sector holds `sector_size / 4 - 1` ids followed by
//! the id of the next DIFAT sector.
//!
//! The MiniFAT is an ordinary FAT-addressed stream of u32 entries.

use super::consts::*;
use super::error::{CfbError, Result};
use super::header::Header;
use super::recovery::ReadOptions;
use super::sector::SectorSource;
use super::stream::read_stream_from_fat;
use crate::common::binary::{decode_u32_table, read_u32_le};
use log::debug;
use std::collections::HashSet;

/// Collect the ids of every FAT sector.
///
/// The number of ids is bounded by both the header's FAT sector count and
/// the sectors physically present, and every DIFAT sector may be visited
/// once.
fn collect_fat_sector_ids<S: SectorSource + ?Sized>(
    source: &S,
    header: &Header,
) -> Result<Vec<u32>> {
    let limit = (header.num_fat_sectors as usize).min(source.sector_count(header));
    let mut fat_sectors: Vec<u32> = header.header_fat_sectors().collect();
    check_fat_sector_count(fat_sectors.len(), limit)?;

    let entries_per_sector = header.entries_per_sector() - 1; // -1 for next DIFAT pointer
    let mut difat_sector = header.first_difat_sector;
    let mut visited = HashSet::new();

    for _ in 0..header.num_difat_sectors {
        if difat_sector == ENDOFCHAIN || difat_sector == FREESECT {
            break;
        }
        if !visited.insert(difat_sector) {
            return Err(CfbError::InvalidHeader(format!(
                "DIFAT chain loops back to sector {}",
                difat_sector
            )));
        }

        let sector_data = source.read_sector(header, difat_sector)?;
        let ids = decode_u32_table(&sector_data[..entries_per_sector * 4]);
        fat_sectors.extend(
            ids.into_iter()
                .take_while(|&sector| sector != FREESECT && sector != ENDOFCHAIN),
        );
        check_fat_sector_count(fat_sectors.len(), limit)?;

        difat_sector = read_u32_le(sector_data, entries_per_sector * 4)?;
    }

    Ok(fat_sectors)
}

fn check_fat_sector_count(count: usize, limit: usize) -> Result<()> {
    if count > limit {
        return Err(CfbError::InvalidHeader(format!(
            "DIFAT lists {} FAT sectors, at most {} possible",
            count, limit
        )));
    }
    Ok(())
}

/// Load the File Allocation Table (FAT)
///
/// Every FAT sector is read strictly: a container whose FAT cannot be read
/// has no usable chains at all.
pub fn load_fat<S: SectorSource + ?Sized>(source: &S, header: &Header) -> Result<Vec<u32>> {
    let fat_sectors = collect_fat_sector_ids(source, header)?;

    let mut fat = Vec::with_capacity(fat_sectors.len() * header.entries_per_sector());
    for &sector_id in &fat_sectors {
        fat.extend(decode_u32_table(source.read_sector(header, sector_id)?));
    }

    debug!(
        "FAT: {} sectors, {} entries",
        fat_sectors.len(),
        fat.len()
    );
    Ok(fat)
}

/// Load the Mini FAT (for small streams)
///
/// The MiniFAT chain is read with the caller's `options`, so a damaged
/// MiniFAT can be recovered in lenient mode.
pub fn load_mini_fat<S: SectorSource + ?Sized>(
    source: &S,
    header: &Header,
    fat: &[u32],
    options: &mut ReadOptions<'_>,
) -> Result<Vec<u32>> {
    if header.num_mini_fat_sectors == 0 || header.first_mini_fat_sector == ENDOFCHAIN {
        return Ok(Vec::new());
    }

    let size = u64::from(header.num_mini_fat_sectors) * header.sector_size as u64;
    let data = read_stream_from_fat(
        source,
        header,
        fat,
        header.first_mini_fat_sector,
        size,
        options,
    )?;

    let mini_fat = decode_u32_table(&data);
    debug!("MiniFAT: {} entries", mini_fat.len());
    Ok(mini_fat)
}
