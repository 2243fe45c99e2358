//! # RED (RFC 2198) Unwrapper
//!
//! A RED payload is a list of block headers followed by the block data.
//! Redundant (secondary) blocks come first and carry 4-byte headers; the
//! last header is a single byte and describes the primary block, whose data
//! runs to the end of the payload.
//!
//! ```text
//!  0                   1                    2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |F|   block PT  |  timestamp offset         |   block length    |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |0|   Block PT  |
//! +-+-+-+-+-+-+-+-+
//! ```

use crate::inspector::region;

const F_BIT: u8 = 0x80;
const PT_MASK: u8 = 0x7F;
const SECONDARY_HEADER_SIZE: usize = 4;
const PRIMARY_HEADER_SIZE: usize = 1;

/// One encoded block inside a RED payload. `offset` is absolute within the
/// buffer that holds the RTP packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedBlock {
    pub offset: usize,
    pub length: usize,
    pub payload_type: u8,
    /// Timestamp offset relative to the RTP timestamp; 0 for the primary.
    pub timestamp_offset: u16,
    pub is_primary: bool,
}

/// Locates the primary encoded block inside a redundancy-wrapped payload.
pub trait RedundancyUnwrapper: Send + Sync {
    fn primary_block(
        &self,
        buf: &[u8],
        payload_offset: usize,
        payload_length: usize,
    ) -> Option<RedBlock>;
}

/// RFC 2198 unwrapper.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rfc2198;

impl RedundancyUnwrapper for Rfc2198 {
    fn primary_block(
        &self,
        buf: &[u8],
        payload_offset: usize,
        payload_length: usize,
    ) -> Option<RedBlock> {
        RedBlocks::new(buf, payload_offset, payload_length)?.find(|block| block.is_primary)
    }
}

/// Iterator over every block of a RED payload, secondary blocks first and
/// the primary block last.
///
/// The header chain is validated up front: construction fails if it never
/// terminates or if the declared secondary lengths overrun the payload.
#[derive(Debug, Clone)]
pub struct RedBlocks<'a> {
    payload: &'a [u8],
    payload_offset: usize,
    header_pos: usize,
    data_pos: usize,
    block_count: usize,
    done: bool,
}

impl<'a> RedBlocks<'a> {
    pub fn new(buf: &'a [u8], payload_offset: usize, payload_length: usize) -> Option<Self> {
        let payload = region(buf, payload_offset, payload_length)?;

        let mut pos = 0;
        let mut block_count = 1;
        let mut secondary_total = 0usize;
        while *payload.get(pos)? & F_BIT != 0 {
            let hdr = payload.get(pos..pos + SECONDARY_HEADER_SIZE)?;
            secondary_total += block_length(hdr);
            block_count += 1;
            pos += SECONDARY_HEADER_SIZE;
        }
        pos += PRIMARY_HEADER_SIZE;

        if pos + secondary_total > payload.len() {
            tracing::debug!(
                headers = pos,
                secondary = secondary_total,
                payload = payload.len(),
                "RED block lengths overrun payload"
            );
            return None;
        }

        Some(Self {
            payload,
            payload_offset,
            header_pos: 0,
            data_pos: pos,
            block_count,
            done: false,
        })
    }

    /// Number of blocks, primary included.
    pub fn block_count(&self) -> usize {
        self.block_count
    }
}

fn block_length(hdr: &[u8]) -> usize {
    (u16::from_be_bytes([hdr[2], hdr[3]]) & 0x3FF) as usize
}

impl Iterator for RedBlocks<'_> {
    type Item = RedBlock;

    fn next(&mut self) -> Option<RedBlock> {
        if self.done {
            return None;
        }

        let first = self.payload[self.header_pos];
        let offset = self.payload_offset + self.data_pos;

        if first & F_BIT == 0 {
            self.done = true;
            return Some(RedBlock {
                offset,
                length: self.payload.len() - self.data_pos,
                payload_type: first & PT_MASK,
                timestamp_offset: 0,
                is_primary: true,
            });
        }

        let hdr = &self.payload[self.header_pos..self.header_pos + SECONDARY_HEADER_SIZE];
        let length = block_length(hdr);
        let timestamp_offset = (u32::from_be_bytes([0, hdr[1], hdr[2], hdr[3]]) >> 10) as u16;
        self.header_pos += SECONDARY_HEADER_SIZE;
        self.data_pos += length;

        Some(RedBlock {
            offset,
            length,
            payload_type: first & PT_MASK,
            timestamp_offset,
            is_primary: false,
        })
    }
}
