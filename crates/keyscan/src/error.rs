//! Error types.
//!
//! None of these cross the classifier boundary: [`crate::classifier`]
//! collapses every failure into `false`. They exist so the envelope reader,
//! dump reader and config loader can report *why* something was rejected.

use thiserror::Error;

/// Failure while reading the RTP envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    #[error("packet region {offset}+{length} exceeds buffer of {buffer} bytes")]
    OutOfBounds {
        offset: usize,
        length: usize,
        buffer: usize,
    },
    #[error("packet truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },
    #[error("padding count {padding} exceeds the {available} bytes after the header")]
    BadPadding { padding: usize, available: usize },
}

/// Failure inside the classifier, before it is collapsed to `false`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    #[error("malformed envelope: {0}")]
    Envelope(#[from] EnvelopeError),
    #[error("unsupported codec {0:?}")]
    UnsupportedCodec(String),
}

/// Failure while reading or writing a packet dump.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DumpError {
    #[error("record {index} truncated: need {needed} bytes, have {available}")]
    TruncatedRecord {
        index: usize,
        needed: usize,
        available: usize,
    },
    #[error("packet of {0} bytes does not fit a 16-bit record length")]
    Oversized(usize),
}

/// Failure while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unsupported config version {0}")]
    UnsupportedVersion(u32),
    #[error("{field} = {value} is not a valid payload type (0-127)")]
    InvalidPayloadType { field: &'static str, value: u32 },
    #[error("unsupported codec {0:?}")]
    UnsupportedCodec(String),
    #[error("duplicate stream name {0:?}")]
    DuplicateStream(String),
}
