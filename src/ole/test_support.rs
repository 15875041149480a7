//! Test fixtures: in-memory container builder and sector read counter.

use super::consts::*;
use super::header::Header;
use super::sector::{OutOfRange, SectorSource, read_sector};
use std::cell::Cell;

/// A header with typical geometry for `sector_size` and no tables.
pub(crate) fn header_with_sector_size(sector_size: usize) -> Header {
    Header {
        minor_version: 0x3E,
        major_version: if sector_size == SECTOR_SIZE_V4 { 4 } else { 3 },
        sector_size,
        mini_sector_size: 64,
        num_dir_sectors: 0,
        num_fat_sectors: 0,
        first_dir_sector: ENDOFCHAIN,
        mini_stream_cutoff: 4096,
        first_mini_fat_sector: ENDOFCHAIN,
        num_mini_fat_sectors: 0,
        first_difat_sector: ENDOFCHAIN,
        num_difat_sectors: 0,
        difat: [FREESECT; HEADER_DIFAT_ENTRIES],
    }
}

/// One sector of little-endian u32 entries, padded with FREESECT.
pub(crate) fn u32_sector(sector_size: usize, entries: &[u32]) -> Vec<u8> {
    let mut data: Vec<u8> = entries.iter().flat_map(|v| v.to_le_bytes()).collect();
    while data.len() < sector_size {
        data.extend_from_slice(&FREESECT.to_le_bytes());
    }
    data.truncate(sector_size);
    data
}

/// Sector source that counts how often it is asked for a sector.
pub(crate) struct CountingSource<'d> {
    data: &'d [u8],
    reads: Cell<usize>,
}

impl<'d> CountingSource<'d> {
    pub(crate) fn new(data: &'d [u8]) -> Self {
        CountingSource {
            data,
            reads: Cell::new(0),
        }
    }

    pub(crate) fn reads(&self) -> usize {
        self.reads.get()
    }
}

impl SectorSource for CountingSource<'_> {
    fn read_sector(&self, header: &Header, sector: u32) -> Result<&[u8], OutOfRange> {
        self.reads.set(self.reads.get() + 1);
        read_sector(self.data, header, sector)
    }

    fn byte_len(&self) -> usize {
        self.data.len()
    }
}

/// Location of a stream written by [`ContainerBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Placed {
    pub sid: u32,
    pub start: u32,
    pub size: u64,
}

/// Lays out a small, valid compound file in memory.
///
/// Streams below the mini stream cutoff go to the mini stream, larger ones
/// get contiguous FAT chains. Sectors are laid out as: stream data, mini
/// stream, MiniFAT, directory, FAT.
pub(crate) struct ContainerBuilder {
    sector_size: usize,
    sectors: Vec<Vec<u8>>,
    fat: Vec<u32>,
    mini_stream: Vec<u8>,
    mini_fat: Vec<u32>,
    entries: Vec<(String, u32, u64)>,
    fat_patches: Vec<(u32, u32)>,
}

impl ContainerBuilder {
    pub(crate) fn new(sector_size: usize) -> Self {
        ContainerBuilder {
            sector_size,
            sectors: Vec::new(),
            fat: Vec::new(),
            mini_stream: Vec::new(),
            mini_fat: Vec::new(),
            entries: Vec::new(),
            fat_patches: Vec::new(),
        }
    }

    fn alloc_chain(&mut self, data: &[u8]) -> u32 {
        if data.is_empty() {
            return ENDOFCHAIN;
        }
        let start = self.sectors.len() as u32;
        for chunk in data.chunks(self.sector_size) {
            let mut sector = chunk.to_vec();
            sector.resize(self.sector_size, 0);
            self.fat.push(self.sectors.len() as u32 + 1);
            self.sectors.push(sector);
        }
        if let Some(last) = self.fat.last_mut() {
            *last = ENDOFCHAIN;
        }
        start
    }

    fn alloc_mini_chain(&mut self, data: &[u8]) -> u32 {
        if data.is_empty() {
            return ENDOFCHAIN;
        }
        let start = self.mini_fat.len() as u32;
        for chunk in data.chunks(64) {
            self.mini_stream.extend_from_slice(chunk);
            self.mini_stream.resize(self.mini_fat.len() * 64 + 64, 0);
            self.mini_fat.push(self.mini_fat.len() as u32 + 1);
        }
        if let Some(last) = self.mini_fat.last_mut() {
            *last = ENDOFCHAIN;
        }
        start
    }

    /// Add a named stream; returns its directory id and locator.
    pub(crate) fn add_stream(&mut self, name: &str, data: &[u8]) -> Placed {
        let start = if data.len() < 4096 {
            self.alloc_mini_chain(data)
        } else {
            self.alloc_chain(data)
        };
        self.entries
            .push((name.to_string(), start, data.len() as u64));
        Placed {
            sid: self.entries.len() as u32,
            start,
            size: data.len() as u64,
        }
    }

    /// Overwrite a FAT entry after layout.
    pub(crate) fn patch_fat(&mut self, sector: u32, value: u32) {
        self.fat_patches.push((sector, value));
    }

    fn directory_entry(name: &str, entry_type: u8, start: u32, size: u64) -> [u8; DIRENTRY_SIZE] {
        let mut entry = [0u8; DIRENTRY_SIZE];
        let units: Vec<u16> = name.encode_utf16().take(31).collect();
        for (i, unit) in units.iter().enumerate() {
            entry[i * 2..i * 2 + 2].copy_from_slice(&unit.to_le_bytes());
        }
        let name_len = (units.len() as u16 + 1) * 2;
        entry[0x40..0x42].copy_from_slice(&name_len.to_le_bytes());
        entry[0x42] = entry_type;
        entry[0x43] = 1;
        entry[0x44..0x50].fill(0xFF);
        entry[DIRENTRY_START_SECTOR_OFFSET..DIRENTRY_START_SECTOR_OFFSET + 4]
            .copy_from_slice(&start.to_le_bytes());
        entry[DIRENTRY_STREAM_SIZE_OFFSET..DIRENTRY_STREAM_SIZE_OFFSET + 8]
            .copy_from_slice(&size.to_le_bytes());
        entry
    }

    pub(crate) fn build(mut self) -> Vec<u8> {
        let mini_stream = std::mem::take(&mut self.mini_stream);
        let root_start = self.alloc_chain(&mini_stream);

        let mini_fat_bytes: Vec<u8> = self.mini_fat.iter().flat_map(|v| v.to_le_bytes()).collect();
        let first_mini_fat_sector = self.alloc_chain(&mini_fat_bytes);
        let num_mini_fat_sectors = mini_fat_bytes.len().div_ceil(self.sector_size) as u32;

        let mut directory = Vec::new();
        directory.extend_from_slice(&Self::directory_entry(
            "Root Entry",
            5,
            root_start,
            mini_stream.len() as u64,
        ));
        for (name, start, size) in &self.entries {
            directory.extend_from_slice(&Self::directory_entry(name, 2, *start, *size));
        }
        while directory.len() % self.sector_size != 0 {
            let mut empty = [0u8; DIRENTRY_SIZE];
            empty[0x44..0x50].fill(0xFF);
            directory.extend_from_slice(&empty);
        }
        let first_dir_sector = self.alloc_chain(&directory);
        let num_dir_sectors = (directory.len() / self.sector_size) as u32;

        let entries_per_sector = self.sector_size / 4;
        let mut num_fat_sectors = 1;
        while (self.sectors.len() + num_fat_sectors).div_ceil(entries_per_sector) > num_fat_sectors {
            num_fat_sectors += 1;
        }
        let fat_ids: Vec<u32> =
            (self.sectors.len()..self.sectors.len() + num_fat_sectors).map(|id| id as u32).collect();
        self.fat.extend(std::iter::repeat_n(FATSECT, num_fat_sectors));
        self.fat.resize(num_fat_sectors * entries_per_sector, FREESECT);
        for &(sector, value) in &self.fat_patches {
            self.fat[sector as usize] = value;
        }

        let (major, shift) = if self.sector_size == SECTOR_SIZE_V4 {
            (4u16, 12u16)
        } else {
            (3u16, 9u16)
        };

        let mut header = vec![0u8; self.sector_size];
        header[0..8].copy_from_slice(MAGIC);
        header[0x18..0x1A].copy_from_slice(&0x3Eu16.to_le_bytes());
        header[0x1A..0x1C].copy_from_slice(&major.to_le_bytes());
        header[0x1C..0x1E].copy_from_slice(&BYTE_ORDER_LE.to_le_bytes());
        header[0x1E..0x20].copy_from_slice(&shift.to_le_bytes());
        header[0x20..0x22].copy_from_slice(&6u16.to_le_bytes());
        let dir_count = if major == 4 { num_dir_sectors } else { 0 };
        header[0x28..0x2C].copy_from_slice(&dir_count.to_le_bytes());
        header[0x2C..0x30].copy_from_slice(&(num_fat_sectors as u32).to_le_bytes());
        header[0x30..0x34].copy_from_slice(&first_dir_sector.to_le_bytes());
        header[0x38..0x3C].copy_from_slice(&4096u32.to_le_bytes());
        header[0x3C..0x40].copy_from_slice(&first_mini_fat_sector.to_le_bytes());
        header[0x40..0x44].copy_from_slice(&num_mini_fat_sectors.to_le_bytes());
        header[0x44..0x48].copy_from_slice(&ENDOFCHAIN.to_le_bytes());
        header[0x48..0x4C].copy_from_slice(&0u32.to_le_bytes());
        for slot in 0..HEADER_DIFAT_ENTRIES {
            let id = fat_ids.get(slot).copied().unwrap_or(FREESECT);
            let offset = 0x4C + slot * 4;
            header[offset..offset + 4].copy_from_slice(&id.to_le_bytes());
        }

        let mut data = header;
        for sector in &self.sectors {
            data.extend_from_slice(sector);
        }
        for fat_sector in self.fat.chunks(entries_per_sector) {
            data.extend(u32_sector(self.sector_size, fat_sector));
        }
        data
    }
}
