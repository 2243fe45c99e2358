//! # Key-Frame Classifier
//!
//! Decides, from a single RTP packet and the codec in use, whether the packet
//! carries the start of a video key frame, either directly or as the
//! primary block of a RED wrapper.
//!
//! The answer is always a plain `bool`. Malformed input, unsupported codecs
//! and payload-type mismatches all collapse to `false`; they are only
//! distinguishable through `tracing` events:
//!
//! | Outcome              | Level   |
//! |----------------------|---------|
//! | unsupported codec    | `WARN`  |
//! | malformed / truncated| `DEBUG` |
//! | payload type mismatch| `TRACE` |
//!
//! Packets retransmitted over RTX that reuse the codec's payload type are
//! classified as if they were original packets.

use std::fmt;

use once_cell::sync::Lazy;

use crate::codec::VideoCodec;
use crate::config::StreamConfig;
use crate::error::{ClassifyError, EnvelopeError};
use crate::h264::H264Inspector;
use crate::inspector::{region, KeyFrameInspector};
use crate::red::{RedundancyUnwrapper, Rfc2198};
use crate::rtp::RtpView;
use crate::vp8::Vp8Inspector;

static DEFAULT_CLASSIFIER: Lazy<KeyFrameClassifier> = Lazy::new(KeyFrameClassifier::default);

/// Classify a packet with the built-in VP8/H.264 inspectors and RFC 2198
/// unwrapper.
///
/// - `red_pt`: RED payload type negotiated for the stream, if any.
/// - `codec_pt`: payload type of the target codec.
/// - `codec_name`: codec name, matched case-insensitively.
pub fn is_key_frame(
    packet: Option<&RtpView<'_>>,
    red_pt: Option<u8>,
    codec_pt: Option<u8>,
    codec_name: &str,
) -> bool {
    DEFAULT_CLASSIFIER.is_key_frame(packet, red_pt, codec_pt, codec_name)
}

/// What happened inside a classification, before collapsing to `bool`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    KeyFrame,
    NotKeyFrame,
    /// No inspector was consulted.
    Mismatch,
}

impl From<bool> for Verdict {
    fn from(key: bool) -> Self {
        if key {
            Verdict::KeyFrame
        } else {
            Verdict::NotKeyFrame
        }
    }
}

/// Stateless classifier over injectable inspectors and RED unwrapper.
pub struct KeyFrameClassifier {
    vp8: Box<dyn KeyFrameInspector>,
    h264: Box<dyn KeyFrameInspector>,
    red: Box<dyn RedundancyUnwrapper>,
}

impl Default for KeyFrameClassifier {
    fn default() -> Self {
        Self {
            vp8: Box::new(Vp8Inspector),
            h264: Box::new(H264Inspector),
            red: Box::new(Rfc2198),
        }
    }
}

impl fmt::Debug for KeyFrameClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyFrameClassifier").finish_non_exhaustive()
    }
}

impl KeyFrameClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vp8_inspector(mut self, inspector: impl KeyFrameInspector + 'static) -> Self {
        self.vp8 = Box::new(inspector);
        self
    }

    pub fn with_h264_inspector(mut self, inspector: impl KeyFrameInspector + 'static) -> Self {
        self.h264 = Box::new(inspector);
        self
    }

    pub fn with_unwrapper(mut self, unwrapper: impl RedundancyUnwrapper + 'static) -> Self {
        self.red = Box::new(unwrapper);
        self
    }

    /// Classify a packet for the codec named `codec_name`.
    pub fn is_key_frame(
        &self,
        packet: Option<&RtpView<'_>>,
        red_pt: Option<u8>,
        codec_pt: Option<u8>,
        codec_name: &str,
    ) -> bool {
        let Some(packet) = packet else {
            return false;
        };
        let result = match VideoCodec::from_name(codec_name) {
            VideoCodec::Unsupported => Err(ClassifyError::UnsupportedCodec(codec_name.to_owned())),
            codec => self.try_classify(packet, red_pt, codec_pt, codec),
        };
        collapse(result, codec_pt)
    }

    /// Same as [`is_key_frame`](Self::is_key_frame) with the codec already
    /// resolved.
    pub fn is_codec_key_frame(
        &self,
        packet: Option<&RtpView<'_>>,
        red_pt: Option<u8>,
        codec_pt: Option<u8>,
        codec: VideoCodec,
    ) -> bool {
        let Some(packet) = packet else {
            return false;
        };
        collapse(self.try_classify(packet, red_pt, codec_pt, codec), codec_pt)
    }

    fn try_classify(
        &self,
        packet: &RtpView<'_>,
        red_pt: Option<u8>,
        codec_pt: Option<u8>,
        codec: VideoCodec,
    ) -> Result<Verdict, ClassifyError> {
        let inspector: &dyn KeyFrameInspector = match codec {
            VideoCodec::Vp8 => self.vp8.as_ref(),
            VideoCodec::H264 => self.h264.as_ref(),
            VideoCodec::Unsupported => {
                return Err(ClassifyError::UnsupportedCodec(codec.to_string()));
            }
        };
        let Some(codec_pt) = codec_pt else {
            return Ok(Verdict::Mismatch);
        };

        let buf = packet.buffer();
        let pt = packet.payload_type()?;

        if red_pt == Some(pt) {
            let (offset, len) = codec_region(packet)?;
            let primary = self.red.primary_block(buf, offset, len);
            return match primary {
                Some(block) if block.payload_type == codec_pt => {
                    if region(buf, block.offset, block.length).is_none() {
                        return Err(EnvelopeError::OutOfBounds {
                            offset: block.offset,
                            length: block.length,
                            buffer: buf.len(),
                        }
                        .into());
                    }
                    Ok(inspector.is_key_frame(buf, block.offset, block.length).into())
                }
                _ => Ok(Verdict::Mismatch),
            };
        }

        if pt == codec_pt {
            let (offset, len) = codec_region(packet)?;
            return Ok(inspector.is_key_frame(buf, offset, len).into());
        }

        Ok(Verdict::Mismatch)
    }
}

/// Media region of a packet: from the end of the header up to (not
/// including) the padding. Handed to the codec inspector for plain packets
/// and to the RED unwrapper otherwise, whatever the codec.
pub fn codec_region(packet: &RtpView<'_>) -> Result<(usize, usize), EnvelopeError> {
    Ok((packet.payload_offset()?, packet.media_length()?))
}

fn collapse(result: Result<Verdict, ClassifyError>, codec_pt: Option<u8>) -> bool {
    match result {
        Ok(Verdict::KeyFrame) => true,
        Ok(Verdict::NotKeyFrame) => false,
        Ok(Verdict::Mismatch) => {
            tracing::trace!(codec_pt = ?codec_pt, "payload type mismatch, packet not inspected");
            false
        }
        Err(ClassifyError::UnsupportedCodec(codec)) => {
            tracing::warn!(%codec, "unsupported codec, packet not inspected");
            false
        }
        Err(e @ ClassifyError::Envelope(_)) => {
            tracing::debug!(error = %e, "malformed packet while checking for key frame");
            false
        }
    }
}

// ─── Per-stream binding ──────────────────────────────────────────────────────

/// A classifier bound to one configured stream.
#[derive(Debug, Clone, Copy)]
pub struct StreamClassifier<'c> {
    classifier: &'c KeyFrameClassifier,
    codec: VideoCodec,
    payload_type: u8,
    red_payload_type: Option<u8>,
}

impl StreamClassifier<'static> {
    /// Bind the built-in classifier to `stream`.
    pub fn new(stream: &StreamConfig) -> Self {
        DEFAULT_CLASSIFIER.for_stream(stream)
    }
}

impl<'c> StreamClassifier<'c> {
    pub fn codec(&self) -> VideoCodec {
        self.codec
    }

    /// Classify a whole-slice RTP packet.
    pub fn classify(&self, packet: &[u8]) -> bool {
        let view = RtpView::from_slice(packet);
        self.classify_view(&view)
    }

    pub fn classify_view(&self, packet: &RtpView<'_>) -> bool {
        self.classifier.is_codec_key_frame(
            Some(packet),
            self.red_payload_type,
            Some(self.payload_type),
            self.codec,
        )
    }
}

impl KeyFrameClassifier {
    pub fn for_stream(&self, stream: &StreamConfig) -> StreamClassifier<'_> {
        StreamClassifier {
            classifier: self,
            codec: stream.codec,
            payload_type: stream.payload_type,
            red_payload_type: stream.red_payload_type,
        }
    }
}
