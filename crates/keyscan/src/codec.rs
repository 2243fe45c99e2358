//! # Codec selector
//!
//! Resolves a codec name once at the boundary so the classifier can
//! dispatch on a closed enum instead of comparing strings per packet.

use std::fmt;

const H264_NAMES: [&str; 3] = ["h264", "h.264", "avc"];

/// Video codec the classifier knows how to inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoCodec {
    Vp8,
    H264,
    /// Any name outside the recognized vocabulary.
    Unsupported,
}

impl VideoCodec {
    /// Parse from a codec name (ASCII case-insensitive, no trimming).
    /// Unknown names map to [`VideoCodec::Unsupported`].
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("vp8") {
            VideoCodec::Vp8
        } else if H264_NAMES.iter().any(|alias| name.eq_ignore_ascii_case(alias)) {
            VideoCodec::H264
        } else {
            VideoCodec::Unsupported
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, VideoCodec::Unsupported)
    }

    /// Canonical encoding name as used in SDP `a=rtpmap`.
    pub fn encoding_name(&self) -> &'static str {
        match self {
            VideoCodec::Vp8 => "VP8",
            VideoCodec::H264 => "H264",
            VideoCodec::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.encoding_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_from_name() {
        assert_eq!(VideoCodec::from_name("VP8"), VideoCodec::Vp8);
        assert_eq!(VideoCodec::from_name("vp8"), VideoCodec::Vp8);
        assert_eq!(VideoCodec::from_name("H264"), VideoCodec::H264);
        assert_eq!(VideoCodec::from_name("h264"), VideoCodec::H264);
        assert_eq!(VideoCodec::from_name("AVC"), VideoCodec::H264);
        assert_eq!(VideoCodec::from_name("VP9"), VideoCodec::Unsupported);
        assert_eq!(VideoCodec::from_name(""), VideoCodec::Unsupported);
    }

    #[test]
    fn codec_name_is_not_trimmed() {
        assert_eq!(VideoCodec::from_name(" vp8\t"), VideoCodec::Unsupported);
        assert_eq!(VideoCodec::from_name("H264 "), VideoCodec::Unsupported);
        assert_eq!(VideoCodec::from_name("h.264"), VideoCodec::H264);
        assert_eq!(VideoCodec::from_name("Avc"), VideoCodec::H264);
    }

    #[test]
    fn encoding_names() {
        assert_eq!(VideoCodec::Vp8.to_string(), "VP8");
        assert_eq!(VideoCodec::H264.to_string(), "H264");
        assert!(!VideoCodec::Unsupported.is_supported());
    }
}
