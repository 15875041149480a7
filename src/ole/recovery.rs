//! Strict and lenient recovery
//!
//! Stream assembly classifies every structural problem it meets as a
//! [`Deviation`]. In strict mode a deviation becomes a [`CfbError`]; in
//! lenient mode it becomes a [`Warning`] handed to the caller's sink and
//! assembly continues with zero-filled data.

use super::chain::ChainError;
use super::error::CfbError;
use super::sector::OutOfRange;
use log::warn;
use serde::Serialize;
use smallvec::SmallVec;
use std::fmt;

/// Identifier of a recoverable condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningCode {
    /// The chain could not be walked (cycle, or a link outside the table)
    FatChainInvalid,
    /// The chain has fewer sectors than the declared size needs
    FatChainTooShort,
    /// The chain has more sectors than the declared size needs
    FatChainLengthMismatch,
    /// A sector of the chain lies outside the container
    FatSectorReadFailed,
    /// A mini sector of the chain lies outside the mini stream
    MinistreamTruncated,
}

impl WarningCode {
    /// Stable wire name of the code.
    pub fn as_str(self) -> &'static str {
        match self {
            WarningCode::FatChainInvalid => "FAT_CHAIN_INVALID",
            WarningCode::FatChainTooShort => "FAT_CHAIN_TOO_SHORT",
            WarningCode::FatChainLengthMismatch => "FAT_CHAIN_LENGTH_MISMATCH",
            WarningCode::FatSectorReadFailed => "FAT_SECTOR_READ_FAILED",
            WarningCode::MinistreamTruncated => "MINISTREAM_TRUNCATED",
        }
    }
}

impl fmt::Display for WarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic key/value context attached to a warning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WarningMeta(SmallVec<[(&'static str, u64); 4]>);

impl WarningMeta {
    fn with(mut self, key: &'static str, value: impl TryInto<u64>) -> Self {
        self.0.push((key, value.try_into().unwrap_or(u64::MAX)));
        self
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<u64> {
        self.0.iter().find(|(k, _)| *k == key).map(|&(_, v)| v)
    }

    /// Iterate over the key/value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        self.0.iter().copied()
    }
}

/// A recoverable condition reported in lenient mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub code: WarningCode,
    /// Name of the operation that produced the warning
    pub operation: &'static str,
    pub message: String,
    pub meta: WarningMeta,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.operation, self.message)
    }
}

/// Per-call read configuration.
///
/// # Examples
///
/// ```
/// use litchi_cfb::ole::{ReadOptions, Warning};
///
/// let strict = ReadOptions::strict();
/// assert!(strict.strict);
///
/// let mut seen: Vec<Warning> = Vec::new();
/// let mut sink = |w: &Warning| seen.push(w.clone());
/// let lenient = ReadOptions::lenient(&mut sink);
/// assert!(!lenient.strict);
/// ```
pub struct ReadOptions<'a> {
    /// Fail on the first deviation instead of recovering
    pub strict: bool,
    /// Receives every warning raised in lenient mode, before the call returns
    pub on_warning: Option<&'a mut dyn FnMut(&Warning)>,
}

impl<'a> ReadOptions<'a> {
    /// Fail-fast reading; no partial results.
    pub fn strict() -> Self {
        ReadOptions {
            strict: true,
            on_warning: None,
        }
    }

    /// Best-effort reading, reporting every recovery to `sink`.
    pub fn lenient(sink: &'a mut dyn FnMut(&Warning)) -> Self {
        ReadOptions {
            strict: false,
            on_warning: Some(sink),
        }
    }
}

impl Default for ReadOptions<'_> {
    fn default() -> Self {
        Self::strict()
    }
}

impl fmt::Debug for ReadOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadOptions")
            .field("strict", &self.strict)
            .field("on_warning", &self.on_warning.is_some())
            .finish()
    }
}

/// A structural problem found while assembling a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deviation {
    ChainInvalid(ChainError),
    ChainTooShort { chain: usize, required: usize },
    ChainLengthMismatch { chain: usize, required: usize },
    SectorReadFailed { index: usize, source: OutOfRange },
    MiniStreamTruncated {
        index: usize,
        mini_sector: u32,
        end: usize,
        available: usize,
    },
}

impl Deviation {
    /// Compare a walked chain length with the sectors a declared size needs.
    pub fn classify_chain_length(chain: usize, required: usize) -> Option<Deviation> {
        match chain.cmp(&required) {
            std::cmp::Ordering::Less => Some(Deviation::ChainTooShort { chain, required }),
            std::cmp::Ordering::Greater => {
                Some(Deviation::ChainLengthMismatch { chain, required })
            },
            std::cmp::Ordering::Equal => None,
        }
    }

    /// The strict-mode rendition.
    pub fn into_error(self) -> CfbError {
        match self {
            Deviation::ChainInvalid(err) => CfbError::Chain(err),
            Deviation::ChainTooShort { chain, required } => {
                CfbError::ChainTooShort { chain, required }
            },
            Deviation::ChainLengthMismatch { chain, required } => {
                CfbError::ChainLengthMismatch { chain, required }
            },
            Deviation::SectorReadFailed { source, .. } => CfbError::SectorOutOfRange(source),
            Deviation::MiniStreamTruncated {
                mini_sector,
                end,
                available,
                ..
            } => CfbError::MiniStreamTruncated {
                mini_sector,
                end,
                available,
            },
        }
    }

    /// The lenient-mode rendition.
    pub fn to_warning(&self, operation: &'static str) -> Warning {
        let meta = WarningMeta::default();
        let (code, message, meta) = match *self {
            Deviation::ChainInvalid(ChainError::TooLong { start, max_steps }) => (
                WarningCode::FatChainInvalid,
                format!(
                    "chain starting at sector {} did not end within {} sectors; stream zero-filled",
                    start, max_steps
                ),
                meta.with("start", start).with("max_steps", max_steps),
            ),
            Deviation::ChainInvalid(ChainError::SectorOutOfTable { sector, table_len }) => (
                WarningCode::FatChainInvalid,
                format!(
                    "chain links to sector {} outside a table of {} entries; stream zero-filled",
                    sector, table_len
                ),
                meta.with("sector", sector).with("table_len", table_len),
            ),
            Deviation::ChainTooShort { chain, required } => (
                WarningCode::FatChainTooShort,
                format!(
                    "chain has {} sectors but {} are required; missing tail zero-filled",
                    chain, required
                ),
                meta.with("chain", chain).with("required", required),
            ),
            Deviation::ChainLengthMismatch { chain, required } => (
                WarningCode::FatChainLengthMismatch,
                format!(
                    "chain has {} sectors but only {} are required; extra sectors ignored",
                    chain, required
                ),
                meta.with("chain", chain).with("required", required),
            ),
            Deviation::SectorReadFailed { index, source } => (
                WarningCode::FatSectorReadFailed,
                format!("{}; copying stopped after {} sectors", source, index),
                meta.with("index", index)
                    .with("sector", source.sector)
                    .with("offset", source.offset)
                    .with("available", source.available),
            ),
            Deviation::MiniStreamTruncated {
                index,
                mini_sector,
                end,
                available,
            } => (
                WarningCode::MinistreamTruncated,
                format!(
                    "mini sector {} ends at byte {} past the {}-byte mini stream; copying stopped after {} sectors",
                    mini_sector, end, available, index
                ),
                meta.with("index", index)
                    .with("mini_sector", mini_sector)
                    .with("end", end)
                    .with("available", available),
            ),
        };

        Warning {
            code,
            operation,
            message,
            meta,
        }
    }
}

/// Applies [`ReadOptions`] to the deviations of one operation.
pub(crate) struct Recovery<'r, 'a> {
    options: &'r mut ReadOptions<'a>,
    operation: &'static str,
}

impl<'r, 'a> Recovery<'r, 'a> {
    /// Validate the options for `operation`.
    ///
    /// Lenient mode without a sink is rejected in either mode.
    pub(crate) fn new(
        options: &'r mut ReadOptions<'a>,
        operation: &'static str,
    ) -> Result<Self, CfbError> {
        if !options.strict && options.on_warning.is_none() {
            return Err(CfbError::MissingWarningSink { operation });
        }
        Ok(Recovery { options, operation })
    }

    /// Fail in strict mode, report and continue in lenient mode.
    pub(crate) fn recover(&mut self, deviation: Deviation) -> Result<(), CfbError> {
        if self.options.strict {
            return Err(deviation.into_error());
        }

        let warning = deviation.to_warning(self.operation);
        warn!("{}", warning);
        if let Some(sink) = self.options.on_warning.as_deref_mut() {
            sink(&warning);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_chain_length() {
        assert_eq!(Deviation::classify_chain_length(2, 2), None);
        assert_eq!(
            Deviation::classify_chain_length(1, 2),
            Some(Deviation::ChainTooShort {
                chain: 1,
                required: 2
            })
        );
        assert_eq!(
            Deviation::classify_chain_length(5, 2),
            Some(Deviation::ChainLengthMismatch {
                chain: 5,
                required: 2
            })
        );
    }

    #[test]
    fn test_warning_meta_and_code() {
        let warning = Deviation::ChainTooShort {
            chain: 3,
            required: 4,
        }
        .to_warning("read_stream_from_fat");

        assert_eq!(warning.code, WarningCode::FatChainTooShort);
        assert_eq!(warning.code.as_str(), "FAT_CHAIN_TOO_SHORT");
        assert_eq!(warning.operation, "read_stream_from_fat");
        assert_eq!(warning.meta.get("chain"), Some(3));
        assert_eq!(warning.meta.get("required"), Some(4));
        assert_eq!(warning.meta.get("missing"), None);
        assert!(warning.to_string().starts_with("[FAT_CHAIN_TOO_SHORT]"));
    }

    #[test]
    fn test_strict_recovery_fails() {
        let mut options = ReadOptions::strict();
        let mut recovery = Recovery::new(&mut options, "op").unwrap();
        let err = recovery
            .recover(Deviation::ChainLengthMismatch {
                chain: 3,
                required: 1,
            })
            .unwrap_err();
        assert!(matches!(
            err,
            CfbError::ChainLengthMismatch {
                chain: 3,
                required: 1
            }
        ));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_lenient_recovery_reports() {
        let mut seen = Vec::new();
        let mut sink = |w: &Warning| seen.push(w.clone());
        let mut options = ReadOptions::lenient(&mut sink);
        let mut recovery = Recovery::new(&mut options, "op").unwrap();

        recovery
            .recover(Deviation::ChainInvalid(ChainError::TooLong {
                start: 4,
                max_steps: 9,
            }))
            .unwrap();
        drop(recovery);
        drop(options);

        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].code, WarningCode::FatChainInvalid);
        assert_eq!(seen[0].meta.get("max_steps"), Some(9));
    }

    #[test]
    fn test_lenient_without_sink_rejected() {
        let mut options = ReadOptions {
            strict: false,
            on_warning: None,
        };
        assert!(matches!(
            Recovery::new(&mut options, "op"),
            Err(CfbError::MissingWarningSink { operation: "op" })
        ));
    }

    #[test]
    fn test_warning_serializes_wire_code() {
        let yaml = serde_saphyr::to_string(&WarningCode::MinistreamTruncated).unwrap();
        assert!(yaml.contains("MINISTREAM_TRUNCATED"));
    }
}
