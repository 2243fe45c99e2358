//! # Stream configuration
//!
//! TOML description of the video streams to scan. The file is parsed into
//! `*ConfigInput` types with every field defaulted, then `resolve()` checks
//! the version and payload types and turns codec names into [`VideoCodec`].
//!
//! ```toml
//! version = 1
//!
//! [[streams]]
//! name = "camera"
//! codec = "VP8"
//! payload_type = 100
//! red_payload_type = 116
//! ```

use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::codec::VideoCodec;
use crate::error::ConfigError;

pub const CONFIG_VERSION: u32 = 1;

/// Largest value a 7-bit RTP payload type can hold.
pub const MAX_PAYLOAD_TYPE: u32 = 127;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KeyscanConfigInput {
    pub version: u32,
    pub streams: Vec<StreamConfigInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StreamConfigInput {
    pub name: Option<String>,
    pub codec: String,
    pub payload_type: u32,
    pub red_payload_type: Option<u32>,
}

/// One video stream: which codec it carries and under which payload types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    pub name: String,
    pub codec: VideoCodec,
    pub payload_type: u8,
    pub red_payload_type: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyscanConfig {
    pub version: u32,
    pub streams: Vec<StreamConfig>,
}

impl Default for KeyscanConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            streams: Vec::new(),
        }
    }
}

fn payload_type(field: &'static str, value: u32) -> Result<u8, ConfigError> {
    if value > MAX_PAYLOAD_TYPE {
        return Err(ConfigError::InvalidPayloadType { field, value });
    }
    Ok(value as u8)
}

impl StreamConfigInput {
    fn resolve(self, idx: usize) -> Result<StreamConfig, ConfigError> {
        let codec = VideoCodec::from_name(&self.codec);
        if !codec.is_supported() {
            return Err(ConfigError::UnsupportedCodec(self.codec));
        }

        let name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("stream-{idx}"));

        Ok(StreamConfig {
            name,
            codec,
            payload_type: payload_type("payload_type", self.payload_type)?,
            red_payload_type: self
                .red_payload_type
                .map(|pt| payload_type("red_payload_type", pt))
                .transpose()?,
        })
    }
}

impl KeyscanConfigInput {
    pub fn resolve(self) -> Result<KeyscanConfig, ConfigError> {
        let version = if self.version == 0 {
            CONFIG_VERSION
        } else {
            self.version
        };
        if version != CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion(version));
        }

        let mut used = HashSet::new();
        let mut streams = Vec::with_capacity(self.streams.len());
        for (idx, input) in self.streams.into_iter().enumerate() {
            let stream = input.resolve(idx)?;
            if !used.insert(stream.name.clone()) {
                return Err(ConfigError::DuplicateStream(stream.name));
            }
            streams.push(stream);
        }

        Ok(KeyscanConfig { version, streams })
    }
}

impl KeyscanConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        if input.trim().is_empty() {
            return Ok(KeyscanConfig::default());
        }
        let parsed: KeyscanConfigInput = toml::from_str(input)?;
        parsed.resolve()
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Ok(Self::from_toml_str(&text)?)
    }

    pub fn stream(&self, name: &str) -> Option<&StreamConfig> {
        self.streams.iter().find(|s| s.name == name)
    }
}
