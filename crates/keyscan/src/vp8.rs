//! # VP8 Payload Inspector
//!
//! Parses the VP8 payload descriptor (RFC 7741 §4.2) and the first octet of
//! the VP8 payload header (§4.3) to detect key frames.
//!
//! ```text
//!       0 1 2 3 4 5 6 7
//!      +-+-+-+-+-+-+-+-+
//!      |X|R|N|S|R| PID | (REQUIRED)
//!      +-+-+-+-+-+-+-+-+
//! X:   |I|L|T|K| RSV   | (OPTIONAL)
//!      +-+-+-+-+-+-+-+-+
//! I:   |M| PictureID   | (OPTIONAL, 7 or 15 bits)
//!      +-+-+-+-+-+-+-+-+
//! L:   |   TL0PICIDX   | (OPTIONAL)
//!      +-+-+-+-+-+-+-+-+
//! T/K: |TID|Y| KEYIDX  | (OPTIONAL)
//!      +-+-+-+-+-+-+-+-+
//! ```
//!
//! Only the first packet of partition 0 carries the payload header, so a
//! key frame is recognised on the packet with `S = 1` and `PID = 0` whose
//! payload header has the inverse key frame flag `P` cleared.

use crate::inspector::{region, KeyFrameInspector};

const X_BIT: u8 = 0x80;
const N_BIT: u8 = 0x20;
const S_BIT: u8 = 0x10;
const PID_MASK: u8 = 0x07;

const I_BIT: u8 = 0x80;
const L_BIT: u8 = 0x40;
const T_BIT: u8 = 0x20;
const K_BIT: u8 = 0x10;
const M_BIT: u8 = 0x80;

/// Inverse key frame flag in the first payload header octet.
const P_BIT: u8 = 0x01;

/// Parsed VP8 payload descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Vp8Descriptor {
    pub non_reference: bool,
    pub start_of_partition: bool,
    pub partition_index: u8,
    /// 7- or 15-bit PictureID.
    pub picture_id: Option<u16>,
    pub tl0_pic_idx: Option<u8>,
    /// Raw TID/Y/KEYIDX octet.
    pub tid_keyidx: Option<u8>,
    /// Descriptor size in bytes.
    pub size: usize,
}

impl Vp8Descriptor {
    /// Parse the descriptor at the start of `payload`.
    ///
    /// Returns `None` if the descriptor runs past the end of the payload.
    pub fn parse(payload: &[u8]) -> Option<Self> {
        let first = *payload.first()?;
        let mut desc = Vp8Descriptor {
            non_reference: first & N_BIT != 0,
            start_of_partition: first & S_BIT != 0,
            partition_index: first & PID_MASK,
            size: 1,
            ..Default::default()
        };

        if first & X_BIT == 0 {
            return Some(desc);
        }

        let ext = *payload.get(1)?;
        desc.size = 2;

        if ext & I_BIT != 0 {
            let pic = *payload.get(desc.size)?;
            if pic & M_BIT != 0 {
                let low = *payload.get(desc.size + 1)?;
                desc.picture_id = Some(u16::from_be_bytes([pic & 0x7F, low]));
                desc.size += 2;
            } else {
                desc.picture_id = Some(pic as u16);
                desc.size += 1;
            }
        }

        if ext & L_BIT != 0 {
            desc.tl0_pic_idx = Some(*payload.get(desc.size)?);
            desc.size += 1;
        }

        if ext & (T_BIT | K_BIT) != 0 {
            desc.tid_keyidx = Some(*payload.get(desc.size)?);
            desc.size += 1;
        }

        Some(desc)
    }

    /// First packet of the frame: start of partition 0.
    pub fn is_start_of_frame(&self) -> bool {
        self.start_of_partition && self.partition_index == 0
    }
}

/// Key-frame inspector for VP8 RTP payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Vp8Inspector;

impl KeyFrameInspector for Vp8Inspector {
    fn is_key_frame(&self, buf: &[u8], offset: usize, len: usize) -> bool {
        let Some(payload) = region(buf, offset, len) else {
            return false;
        };
        let Some(desc) = Vp8Descriptor::parse(payload) else {
            return false;
        };
        if !desc.is_start_of_frame() {
            return false;
        }
        match payload.get(desc.size) {
            Some(header) => header & P_BIT == 0,
            None => false,
        }
    }
}
