//! Stream assembly
//!
//! A stream is reconstructed by walking its allocation chain and copying
//! each sector payload, in chain order, into consecutive fixed-size chunks
//! of the output. The declared size is authoritative: the result is always
//! truncated (or zero-padded) to exactly that many bytes.
//!
//! Regular streams are assembled from the container sectors through the
//! FAT. Streams below the mini stream cutoff are assembled from mini
//! sectors of the already-assembled mini stream through the MiniFAT.

use super::chain::{walk_fat_chain, walk_mini_fat_chain};
use super::consts::*;
use super::error::{CfbError, Result};
use super::header::Header;
use super::recovery::{Deviation, ReadOptions, Recovery};
use super::sector::SectorSource;
use log::debug;

/// Check the declared size and compute how many units it spans.
///
/// Returns `None` for an empty stream.
fn required_units(size: u64, start: u32, unit: usize) -> Result<Option<usize>> {
    if size > MAX_STREAM_SIZE {
        return Err(CfbError::SizeNotRepresentable { size });
    }
    if size == 0 {
        return Ok(None);
    }
    if start == ENDOFCHAIN {
        return Err(CfbError::EmptyChain { size });
    }

    let required = usize::try_from(size.div_ceil(unit as u64))
        .ok()
        .filter(|required| required.checked_mul(unit).is_some())
        .ok_or(CfbError::SizeNotRepresentable { size })?;
    Ok(Some(required))
}

/// Reconcile a walked chain with the number of units a stream needs.
///
/// Returns the prefix of the chain that should be copied.
fn settle_chain(
    walked: std::result::Result<Vec<u32>, super::chain::ChainError>,
    required: usize,
    recovery: &mut Recovery<'_, '_>,
) -> Result<Vec<u32>> {
    let mut chain = match walked {
        Ok(chain) => chain,
        Err(err) => {
            recovery.recover(Deviation::ChainInvalid(err))?;
            return Ok(Vec::new());
        },
    };

    if let Some(deviation) = Deviation::classify_chain_length(chain.len(), required) {
        recovery.recover(deviation)?;
    }
    chain.truncate(required);
    Ok(chain)
}

/// Read a stream by following its FAT chain.
///
/// # Arguments
///
/// * `source` - Container bytes (or any other [`SectorSource`])
/// * `header` - Container geometry
/// * `fat` - File allocation table
/// * `start_sector` - First sector of the stream
/// * `size` - Declared stream size in bytes
/// * `options` - Strict or lenient handling of chain problems
///
/// # Returns
///
/// * `Result<Vec<u8>>` - Exactly `size` bytes. In lenient mode, sectors that
///   could not be located are zero-filled and reported to the warning sink.
///
/// # Examples
///
/// ```
/// use litchi_cfb::ole::{read_stream_from_fat, Header, ReadOptions, ENDOFCHAIN};
///
/// # fn demo(bytes: &[u8], header: &Header) -> litchi_cfb::ole::Result<()> {
/// let fat = vec![ENDOFCHAIN];
/// let data = read_stream_from_fat(bytes, header, &fat, 0, 100, &mut ReadOptions::strict())?;
/// assert_eq!(data.len(), 100);
/// # Ok(())
/// # }
/// ```
pub fn read_stream_from_fat<S: SectorSource + ?Sized>(
    source: &S,
    header: &Header,
    fat: &[u32],
    start_sector: u32,
    size: u64,
    options: &mut ReadOptions<'_>,
) -> Result<Vec<u8>> {
    let mut recovery = Recovery::new(options, "read_stream_from_fat")?;

    let sector_size = header.sector_size;
    let Some(required) = required_units(size, start_sector, sector_size)? else {
        return Ok(Vec::new());
    };

    let max_steps = required.saturating_add(CHAIN_STEP_SLACK);
    let chain = settle_chain(
        walk_fat_chain(fat, start_sector, max_steps),
        required,
        &mut recovery,
    )?;

    let mut data = vec![0u8; required * sector_size];
    for (index, (slot, &sector)) in data.chunks_exact_mut(sector_size).zip(&chain).enumerate() {
        match source.read_sector(header, sector) {
            Ok(payload) => slot.copy_from_slice(payload),
            Err(out_of_range) => {
                recovery.recover(Deviation::SectorReadFailed {
                    index,
                    source: out_of_range,
                })?;
                break;
            },
        }
    }

    debug!(
        "assembled {} bytes from {} of {} FAT sectors starting at {}",
        size,
        chain.len(),
        required,
        start_sector
    );

    // required_units guarantees size fits in usize
    data.truncate(size as usize);
    Ok(data)
}

/// Read a small stream by following its MiniFAT chain.
///
/// Mini sector `n` occupies bytes `n * mini_sector_size ..` of the mini
/// stream, which must have been assembled beforehand from the root entry.
///
/// # Arguments
///
/// * `mini_fat` - Mini allocation table
/// * `mini_stream` - Assembled mini stream bytes
/// * `header` - Container geometry
/// * `start_mini_sector` - First mini sector of the stream
/// * `size` - Declared stream size in bytes
/// * `options` - Strict or lenient handling of chain problems
pub fn read_stream_from_mini_fat(
    mini_fat: &[u32],
    mini_stream: &[u8],
    header: &Header,
    start_mini_sector: u32,
    size: u64,
    options: &mut ReadOptions<'_>,
) -> Result<Vec<u8>> {
    let mut recovery = Recovery::new(options, "read_stream_from_mini_fat")?;

    let unit = header.mini_sector_size;
    let Some(required) = required_units(size, start_mini_sector, unit)? else {
        return Ok(Vec::new());
    };

    let max_steps = required.saturating_add(CHAIN_STEP_SLACK);
    let chain = settle_chain(
        walk_mini_fat_chain(mini_fat, start_mini_sector, max_steps),
        required,
        &mut recovery,
    )?;

    let mut data = vec![0u8; required * unit];
    for (index, (slot, &mini_sector)) in data.chunks_exact_mut(unit).zip(&chain).enumerate() {
        let start = mini_sector as usize * unit;
        match mini_stream.get(start..start + unit) {
            Some(payload) => slot.copy_from_slice(payload),
            None => {
                recovery.recover(Deviation::MiniStreamTruncated {
                    index,
                    mini_sector,
                    end: start + unit,
                    available: mini_stream.len(),
                })?;
                break;
            },
        }
    }

    debug!(
        "assembled {} bytes from {} of {} mini sectors starting at {}",
        size,
        chain.len(),
        required,
        start_mini_sector
    );

    data.truncate(size as usize);
    Ok(data)
}

/// Read the raw Directory Stream.
///
/// Always strict: without the directory nothing else in the container can
/// be located. The directory has no declared size, so every sector of its
/// chain is returned.
pub fn read_directory_stream_bytes<S: SectorSource + ?Sized>(
    source: &S,
    header: &Header,
    fat: &[u32],
) -> Result<Vec<u8>> {
    if header.first_dir_sector == ENDOFCHAIN {
        return Err(CfbError::MissingDirectory);
    }

    let chain = walk_fat_chain(fat, header.first_dir_sector, fat.len())?;
    if chain.is_empty() {
        return Err(CfbError::EmptyDirectory);
    }

    let data = chain.iter().try_fold(
        Vec::with_capacity(chain.len() * header.sector_size),
        |mut data, &sector| -> Result<Vec<u8>> {
            data.extend_from_slice(source.read_sector(header, sector)?);
            Ok(data)
        },
    )?;

    debug!(
        "directory stream: {} sectors, {} entries",
        chain.len(),
        data.len() / DIRENTRY_SIZE
    );
    Ok(data)
}
