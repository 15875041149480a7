use super::consts::*;
use super::error::{CfbError, Result};
use super::fat::{load_fat, load_mini_fat};
use super::header::Header;
use super::recovery::{ReadOptions, Warning};
use super::stream::{read_directory_stream_bytes, read_stream_from_fat, read_stream_from_mini_fat};
use crate::common::binary::{read_u32_le, read_u64_le};
use bytes::Bytes;
use log::debug;
use std::path::Path;

/// Where a stream lives: its first sector (or mini sector) and declared size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamLocator {
    /// First sector of the stream
    pub start: u32,
    /// Size of the stream in bytes
    pub size: u64,
    /// Object type of the owning directory entry
    pub entry_type: u8,
}

impl StreamLocator {
    /// Locator of an ordinary stream entry.
    pub fn new(start: u32, size: u64) -> Self {
        StreamLocator {
            start,
            size,
            entry_type: STGTY_STREAM,
        }
    }

    /// Decode the locator of directory entry `sid` from raw directory bytes.
    ///
    /// Only the object type, start sector and stream size fields are read. Containers with
    /// 512-byte sectors only use the low 32 bits of the size.
    pub fn from_directory_entry(directory: &[u8], sid: u32, header: &Header) -> Result<Self> {
        let base = (sid as usize)
            .checked_mul(DIRENTRY_SIZE)
            .ok_or_else(|| CfbError::InvalidHeader(format!("Invalid directory entry {}", sid)))?;

        let entry_type = directory
            .get(base + DIRENTRY_TYPE_OFFSET)
            .copied()
            .ok_or_else(|| CfbError::InvalidHeader(format!("Invalid directory entry {}", sid)))?;
        let start = read_u32_le(directory, base + DIRENTRY_START_SECTOR_OFFSET)?;
        let raw_size = read_u64_le(directory, base + DIRENTRY_STREAM_SIZE_OFFSET)?;
        let size = if header.sector_size == SECTOR_SIZE_V3 {
            raw_size & 0xFFFF_FFFF
        } else {
            raw_size
        };

        Ok(StreamLocator {
            start,
            size,
            entry_type,
        })
    }

    /// Whether the stream is addressed through the MiniFAT.
    ///
    /// Only stream entries below the cutoff live in the mini stream; the
    /// root entry owns the mini stream itself and is always FAT-addressed.
    #[inline]
    pub fn is_mini(&self, header: &Header) -> bool {
        self.entry_type == STGTY_STREAM && self.size < u64::from(header.mini_stream_cutoff)
    }
}

/// Outcome of one stream in a batch read.
#[derive(Debug)]
pub struct StreamRead {
    pub locator: StreamLocator,
    /// Stream bytes, or the error that stopped assembly
    pub data: Result<Vec<u8>>,
    /// Warnings collected in lenient mode
    pub warnings: Vec<Warning>,
}

/// An opened compound file.
///
/// Holds the container bytes and everything parsed once per session: the
/// header, both allocation tables, the raw Directory Stream and the
/// assembled mini stream. All reads take `&self`, so a `CompoundFile` can
/// be shared between threads.
///
/// # Examples
///
/// ```no_run
/// use litchi_cfb::ole::{CompoundFile, ReadOptions, StreamLocator};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let cfb = CompoundFile::from_path("document.doc")?;
///
/// // Directory entry 1 is usually the first stream below the root
/// let locator = StreamLocator::from_directory_entry(cfb.directory(), 1, cfb.header())?;
/// let data = cfb.read_stream(locator, &mut ReadOptions::strict())?;
/// println!("Stream size: {} bytes", data.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CompoundFile {
    data: Bytes,
    header: Header,
    fat: Vec<u32>,
    mini_fat: Vec<u32>,
    directory: Vec<u8>,
    mini_stream: Vec<u8>,
}

impl CompoundFile {
    /// Open a container, failing on any structural problem.
    pub fn open(data: impl Into<Bytes>) -> Result<Self> {
        Self::open_with(data, &mut ReadOptions::strict())
    }

    /// Open a container from a file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::open(data)
    }

    /// Open a container with explicit recovery options.
    ///
    /// The header, FAT and Directory Stream are always read strictly. The
    /// MiniFAT and mini stream follow `options`.
    pub fn open_with(data: impl Into<Bytes>, options: &mut ReadOptions<'_>) -> Result<Self> {
        let data: Bytes = data.into();

        let header = Header::parse(&data)?;
        let fat = load_fat(&data, &header)?;
        let directory = read_directory_stream_bytes(&data, &header, &fat)?;

        let root = StreamLocator::from_directory_entry(&directory, 0, &header)?;
        let mini_fat = load_mini_fat(&data, &header, &fat, options)?;
        let mini_stream = read_stream_from_fat(&data, &header, &fat, root.start, root.size, options)?;

        debug!(
            "opened compound file: {} bytes, {} directory entries, mini stream {} bytes",
            data.len(),
            directory.len() / DIRENTRY_SIZE,
            mini_stream.len()
        );

        Ok(CompoundFile {
            data,
            header,
            fat,
            mini_fat,
            directory,
            mini_stream,
        })
    }

    pub fn file_size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn fat(&self) -> &[u32] {
        &self.fat
    }

    pub fn mini_fat(&self) -> &[u32] {
        &self.mini_fat
    }

    /// Raw Directory Stream bytes (128 bytes per entry).
    pub fn directory(&self) -> &[u8] {
        &self.directory
    }

    /// Number of directory entry slots, used or not.
    pub fn directory_entry_count(&self) -> usize {
        self.directory.len() / DIRENTRY_SIZE
    }

    pub fn mini_stream(&self) -> &[u8] {
        &self.mini_stream
    }

    /// Read a stream, through the MiniFAT when it is below the cutoff size.
    pub fn read_stream(&self, locator: StreamLocator, options: &mut ReadOptions<'_>) -> Result<Vec<u8>> {
        if locator.is_mini(&self.header) {
            read_stream_from_mini_fat(
                &self.mini_fat,
                &self.mini_stream,
                &self.header,
                locator.start,
                locator.size,
                options,
            )
        } else {
            read_stream_from_fat(
                &self.data,
                &self.header,
                &self.fat,
                locator.start,
                locator.size,
                options,
            )
        }
    }

    /// Read the stream of directory entry `sid`.
    pub fn read_entry(&self, sid: u32, options: &mut ReadOptions<'_>) -> Result<Vec<u8>> {
        let locator = StreamLocator::from_directory_entry(&self.directory, sid, &self.header)?;
        self.read_stream(locator, options)
    }

    fn read_collecting(&self, locator: StreamLocator, strict: bool) -> StreamRead {
        let mut warnings = Vec::new();
        let data = if strict {
            self.read_stream(locator, &mut ReadOptions::strict())
        } else {
            let mut sink = |warning: &Warning| warnings.push(warning.clone());
            self.read_stream(locator, &mut ReadOptions::lenient(&mut sink))
        };
        StreamRead {
            locator,
            data,
            warnings,
        }
    }

    /// Read several streams, in parallel when the `parallel` feature is on.
    ///
    /// Results come back in the order of `locators`. In lenient mode each
    /// stream's warnings are collected into its own [`StreamRead`].
    pub fn read_streams(&self, locators: &[StreamLocator], strict: bool) -> Vec<StreamRead> {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            locators
                .par_iter()
                .map(|&locator| self.read_collecting(locator, strict))
                .collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            locators
                .iter()
                .map(|&locator| self.read_collecting(locator, strict))
                .collect()
        }
    }
}
