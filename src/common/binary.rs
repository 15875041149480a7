//! Little-endian binary primitives.
//!
//! Every fixed-width field of a compound file (header fields, allocation
//! table entries, directory locators) is decoded through these functions.
//! They work on plain byte slices and never panic on short input.

use zerocopy::{FromBytes, LE, U16, U32, U64};

/// Binary parsing error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinaryError {
    /// Not enough data to read the requested type
    InsufficientData { expected: usize, available: usize },
    /// Failed to parse the data
    ParseError(String),
}

impl std::fmt::Display for BinaryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryError::InsufficientData {
                expected,
                available,
            } => {
                write!(
                    f,
                    "Insufficient data: expected {}, got {}",
                    expected, available
                )
            },
            BinaryError::ParseError(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for BinaryError {}

/// Result type for binary operations
pub type BinaryResult<T> = Result<T, BinaryError>;

/// Borrow `width` bytes at `offset`, checking the end against the slice length.
#[inline]
fn window(data: &[u8], offset: usize, width: usize) -> BinaryResult<&[u8]> {
    let end = offset
        .checked_add(width)
        .ok_or(BinaryError::InsufficientData {
            expected: usize::MAX,
            available: data.len(),
        })?;
    data.get(offset..end).ok_or(BinaryError::InsufficientData {
        expected: end,
        available: data.len(),
    })
}

/// Read a little-endian u16 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use litchi_cfb::common::binary::read_u16_le;
/// let data = [0x34, 0x12, 0x78, 0x56];
/// assert_eq!(read_u16_le(&data, 0).unwrap(), 0x1234);
/// assert_eq!(read_u16_le(&data, 2).unwrap(), 0x5678);
/// ```
#[inline]
pub fn read_u16_le(data: &[u8], offset: usize) -> BinaryResult<u16> {
    U16::<LE>::read_from_bytes(window(data, offset, 2)?)
        .map(|v| v.get())
        .map_err(|_| BinaryError::ParseError("Failed to read u16".to_string()))
}

/// Read a little-endian u32 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use litchi_cfb::common::binary::read_u32_le;
/// let data = [0x78, 0x56, 0x34, 0x12];
/// assert_eq!(read_u32_le(&data, 0).unwrap(), 0x12345678);
/// ```
#[inline]
pub fn read_u32_le(data: &[u8], offset: usize) -> BinaryResult<u32> {
    U32::<LE>::read_from_bytes(window(data, offset, 4)?)
        .map(|v| v.get())
        .map_err(|_| BinaryError::ParseError("Failed to read u32".to_string()))
}

/// Read a little-endian u64 from a byte slice at the given offset.
#[inline]
pub fn read_u64_le(data: &[u8], offset: usize) -> BinaryResult<u64> {
    U64::<LE>::read_from_bytes(window(data, offset, 8)?)
        .map(|v| v.get())
        .map_err(|_| BinaryError::ParseError("Failed to read u64".to_string()))
}

/// Decode a buffer as a packed array of little-endian u32 values.
///
/// Trailing bytes that do not form a whole entry are ignored.
pub fn decode_u32_table(data: &[u8]) -> Vec<u32> {
    data.chunks_exact(4)
        .filter_map(|chunk| U32::<LE>::read_from_bytes(chunk).ok())
        .map(|v| v.get())
        .collect()
}
