//! # RTP Envelope Reader
//!
//! Zero-copy view over an RTP packet (RFC 3550 §5.1) living somewhere inside
//! a larger buffer. Nothing is decoded up front: every derived quantity is
//! computed from the envelope bytes on request and bounds-checked against
//! the view.
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |V=2|P|X|  CC   |M|     PT      |       sequence number         |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                           timestamp                           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |           synchronization source (SSRC) identifier            |
//! +=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+
//! |            contributing source (CSRC) identifiers             |
//! |                             ....                              |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```

use crate::error::EnvelopeError;

// ─── Constants ───────────────────────────────────────────────────────────────

/// Size of the fixed part of the RTP header.
pub const FIXED_HEADER_SIZE: usize = 12;

/// Size of the header extension preamble (profile + length).
pub const EXTENSION_HEADER_SIZE: usize = 4;

const VERSION_MASK: u8 = 0b1100_0000;
const PADDING_MASK: u8 = 0b0010_0000;
const EXTENSION_MASK: u8 = 0b0001_0000;
const CSRC_COUNT_MASK: u8 = 0b0000_1111;
const MARKER_MASK: u8 = 0b1000_0000;
const PAYLOAD_TYPE_MASK: u8 = 0b0111_1111;

// ─── RtpView ─────────────────────────────────────────────────────────────────

/// Immutable view of an RTP packet at `buffer[offset..offset + length]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtpView<'a> {
    buffer: &'a [u8],
    offset: usize,
    length: usize,
}

impl<'a> RtpView<'a> {
    /// Create a view, checking that the region fits inside `buffer`.
    pub fn new(buffer: &'a [u8], offset: usize, length: usize) -> Result<Self, EnvelopeError> {
        match offset.checked_add(length) {
            Some(end) if end <= buffer.len() => Ok(Self {
                buffer,
                offset,
                length,
            }),
            _ => Err(EnvelopeError::OutOfBounds {
                offset,
                length,
                buffer: buffer.len(),
            }),
        }
    }

    /// View covering the whole slice.
    pub fn from_slice(packet: &'a [u8]) -> Self {
        Self {
            buffer: packet,
            offset: 0,
            length: packet.len(),
        }
    }

    /// The full underlying buffer (not just this packet).
    #[inline]
    pub fn buffer(&self) -> &'a [u8] {
        self.buffer
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// The packet bytes.
    #[inline]
    pub fn bytes(&self) -> &'a [u8] {
        &self.buffer[self.offset..self.offset + self.length]
    }

    fn require(&self, needed: usize) -> Result<&'a [u8], EnvelopeError> {
        let bytes = self.bytes();
        if bytes.len() < needed {
            return Err(EnvelopeError::Truncated {
                needed,
                available: bytes.len(),
            });
        }
        Ok(bytes)
    }

    // ─── Fixed header fields ─────────────────────────────────────────────

    /// RTP version (2 bits). Not validated.
    pub fn version(&self) -> Result<u8, EnvelopeError> {
        Ok((self.require(1)?[0] & VERSION_MASK) >> 6)
    }

    /// Whether the P bit is set.
    pub fn has_padding(&self) -> Result<bool, EnvelopeError> {
        Ok(self.require(1)?[0] & PADDING_MASK != 0)
    }

    /// Whether the X bit is set.
    pub fn has_extension(&self) -> Result<bool, EnvelopeError> {
        Ok(self.require(1)?[0] & EXTENSION_MASK != 0)
    }

    pub fn csrc_count(&self) -> Result<usize, EnvelopeError> {
        Ok((self.require(1)?[0] & CSRC_COUNT_MASK) as usize)
    }

    pub fn marker(&self) -> Result<bool, EnvelopeError> {
        Ok(self.require(2)?[1] & MARKER_MASK != 0)
    }

    /// 7-bit payload type.
    pub fn payload_type(&self) -> Result<u8, EnvelopeError> {
        Ok(self.require(2)?[1] & PAYLOAD_TYPE_MASK)
    }

    pub fn sequence_number(&self) -> Result<u16, EnvelopeError> {
        let b = self.require(4)?;
        Ok(u16::from_be_bytes([b[2], b[3]]))
    }

    pub fn timestamp(&self) -> Result<u32, EnvelopeError> {
        let b = self.require(8)?;
        Ok(u32::from_be_bytes([b[4], b[5], b[6], b[7]]))
    }

    pub fn ssrc(&self) -> Result<u32, EnvelopeError> {
        let b = self.require(FIXED_HEADER_SIZE)?;
        Ok(u32::from_be_bytes([b[8], b[9], b[10], b[11]]))
    }

    // ─── Derived lengths ─────────────────────────────────────────────────

    /// Header length: fixed header, CSRC list and (if present) the header
    /// extension including its 4-byte preamble.
    pub fn header_length(&self) -> Result<usize, EnvelopeError> {
        let bytes = self.require(FIXED_HEADER_SIZE)?;
        let mut len = FIXED_HEADER_SIZE + 4 * (bytes[0] & CSRC_COUNT_MASK) as usize;

        if bytes[0] & EXTENSION_MASK != 0 {
            let ext = self.require(len + EXTENSION_HEADER_SIZE)?;
            let words = u16::from_be_bytes([ext[len + 2], ext[len + 3]]) as usize;
            len += EXTENSION_HEADER_SIZE + 4 * words;
        }

        self.require(len)?;
        Ok(len)
    }

    /// Absolute offset (into [`buffer`](Self::buffer)) of the first payload byte.
    pub fn payload_offset(&self) -> Result<usize, EnvelopeError> {
        Ok(self.offset + self.header_length()?)
    }

    /// Everything after the header, padding included.
    pub fn payload_length(&self) -> Result<usize, EnvelopeError> {
        Ok(self.length - self.header_length()?)
    }

    /// Number of padding octets at the tail, including the count octet itself.
    pub fn padding_length(&self) -> Result<usize, EnvelopeError> {
        if !self.has_padding()? {
            return Ok(0);
        }
        let bytes = self.bytes();
        let padding = bytes[bytes.len() - 1] as usize;
        let available = self.payload_length()?;
        if padding > available {
            return Err(EnvelopeError::BadPadding { padding, available });
        }
        Ok(padding)
    }

    /// Payload length with padding removed: `length - header - padding`.
    pub fn media_length(&self) -> Result<usize, EnvelopeError> {
        Ok(self.payload_length()? - self.padding_length()?)
    }

    /// The media payload with header and padding stripped.
    pub fn payload(&self) -> Result<&'a [u8], EnvelopeError> {
        let start = self.payload_offset()?;
        let len = self.media_length()?;
        Ok(&self.buffer[start..start + len])
    }
}

impl<'a> TryFrom<&'a [u8]> for RtpView<'a> {
    type Error = EnvelopeError;

    /// Whole-slice view that also requires a complete fixed header.
    fn try_from(packet: &'a [u8]) -> Result<Self, Self::Error> {
        let view = Self::from_slice(packet);
        view.require(FIXED_HEADER_SIZE)?;
        Ok(view)
    }
}
