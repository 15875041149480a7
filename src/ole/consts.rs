/// Magic bytes that should be at the beginning of every OLE file
pub const MAGIC: &[u8; 8] = b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1";

/// Minimal size of an empty OLE file with 512-byte sectors (1536 bytes)
pub const MINIMAL_OLEFILE_SIZE: usize = 1536;

/// Size of the fixed header structure in bytes
pub const HEADER_SIZE: usize = 512;

/// Size of a directory entry in bytes
pub const DIRENTRY_SIZE: usize = 128;

/// Default sector size for version 3 (512 bytes)
pub const SECTOR_SIZE_V3: usize = 512;

/// Default sector size for version 4 (4096 bytes)
pub const SECTOR_SIZE_V4: usize = 4096;

/// Number of FAT sector ids stored directly in the header
pub const HEADER_DIFAT_ENTRIES: usize = 109;

/// Byte order mark required at offset 0x1C (little-endian)
pub const BYTE_ORDER_LE: u16 = 0xFFFE;

// Sector IDs (from AAF specifications)
/// Maximum regular sector ID
pub const MAXREGSECT: u32 = 0xFFFFFFFA; // -6
/// Denotes a DIFAT sector in a FAT
pub const DIFSECT: u32 = 0xFFFFFFFC; // -4
/// Denotes a FAT sector in a FAT
pub const FATSECT: u32 = 0xFFFFFFFD; // -3
/// End of a virtual stream chain
pub const ENDOFCHAIN: u32 = 0xFFFFFFFE; // -2
/// Unallocated sector
pub const FREESECT: u32 = 0xFFFFFFFF; // -1

/// Largest declared stream size accepted by the assemblers (2^53 - 1).
pub const MAX_STREAM_SIZE: u64 = (1 << 53) - 1;

/// Extra chain steps tolerated beyond the sectors a declared size needs.
///
/// A chain longer than `required + CHAIN_STEP_SLACK` is treated as cyclic.
pub const CHAIN_STEP_SLACK: usize = 16;

// Object types stored in a directory entry
/// Unallocated directory entry
pub const STGTY_EMPTY: u8 = 0;
/// Storage (directory) entry
pub const STGTY_STORAGE: u8 = 1;
/// Stream entry
pub const STGTY_STREAM: u8 = 2;
/// Root entry, owner of the mini stream
pub const STGTY_ROOT: u8 = 5;

// Directory entry locator fields
/// Offset of the object type within a directory entry
pub const DIRENTRY_TYPE_OFFSET: usize = 0x42;
/// Offset of the starting sector within a directory entry
pub const DIRENTRY_START_SECTOR_OFFSET: usize = 0x74;
/// Offset of the stream size within a directory entry
pub const DIRENTRY_STREAM_SIZE_OFFSET: usize = 0x78;
