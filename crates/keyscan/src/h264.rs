//! # H.264 NAL Unit Inspector
//!
//! Classifies the NAL unit(s) at the start of an H.264 RTP payload
//! (RFC 6184). Three packetization modes matter here:
//!
//! - single NAL unit packets (types 1-23), header is the first byte;
//! - STAP-A (24), a 1-byte header followed by `u16` size-prefixed NAL units;
//! - FU-A (28), a 1-byte indicator followed by a 1-byte FU header carrying
//!   the original NAL type.
//!
//! The NAL header is 1 byte: `forbidden(1) | nal_ref_idc(2) | nal_type(5)`.

use crate::inspector::{region, KeyFrameInspector};

pub const NAL_TYPE_MASK: u8 = 0x1F;

pub const NAL_SLICE: u8 = 1;
pub const NAL_IDR: u8 = 5;
pub const NAL_SEI: u8 = 6;
pub const NAL_SPS: u8 = 7;
pub const NAL_PPS: u8 = 8;
pub const NAL_STAP_A: u8 = 24;
pub const NAL_FU_A: u8 = 28;

/// STAP-A NAL header plus the first NALU size field.
const STAP_A_HEADER_SIZE: usize = 1 + 2;
/// FU indicator plus FU header.
const FU_A_HEADER_SIZE: usize = 2;
const FU_START_MASK: u8 = 0x80;

/// Classification result of a NAL unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NalClass {
    /// Parameter sets (SPS, PPS).
    ParameterSet,
    /// IDR slice.
    Keyframe,
    /// Reference slice or data partition.
    Reference,
    /// Non-reference slice, SEI, AU delimiter.
    NonReference,
    /// Aggregation/fragmentation units and reserved types.
    Unknown,
}

/// Parsed NAL header info.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NalInfo {
    /// The raw NAL unit type number.
    pub nal_type: u8,
    pub nal_ref_idc: u8,
    pub class: NalClass,
}

/// Parse a single NAL unit header. Returns `None` if the payload is empty.
pub fn parse_nal(payload: &[u8]) -> Option<NalInfo> {
    let header = *payload.first()?;
    Some(classify_header(header))
}

fn classify_header(header: u8) -> NalInfo {
    let nal_type = header & NAL_TYPE_MASK;
    let nal_ref_idc = (header >> 5) & 0x03;

    let class = match nal_type {
        NAL_SPS | NAL_PPS => NalClass::ParameterSet,
        13 => NalClass::ParameterSet, // SPS Extension
        NAL_IDR => NalClass::Keyframe,
        NAL_SLICE => {
            if nal_ref_idc > 0 {
                NalClass::Reference
            } else {
                NalClass::NonReference
            }
        }
        2..=4 => NalClass::Reference, // Slice data partitions A-C
        NAL_SEI => NalClass::NonReference,
        9 => NalClass::NonReference, // AU delimiter
        _ => NalClass::Unknown,
    };

    NalInfo {
        nal_type,
        nal_ref_idc,
        class,
    }
}

/// Header of the NAL unit an RTP payload starts (or continues) with.
///
/// For STAP-A this is the first aggregated unit, for FU-A the fragmented
/// unit reconstructed from the FU indicator's NRI and the FU header's type.
/// Returns `None` for truncated or inconsistent packets.
pub fn leading_nal(payload: &[u8]) -> Option<NalInfo> {
    let first = *payload.first()?;
    match first & NAL_TYPE_MASK {
        NAL_STAP_A => {
            if payload.len() <= STAP_A_HEADER_SIZE {
                tracing::debug!(len = payload.len(), "STAP-A header truncated");
                return None;
            }
            if !stap_a_lengths_valid(&payload[1..]) {
                tracing::debug!("STAP-A packet with incorrect NALU lengths");
                return None;
            }
            parse_nal(&payload[STAP_A_HEADER_SIZE..])
        }
        NAL_FU_A => {
            if payload.len() < FU_A_HEADER_SIZE {
                tracing::debug!(len = payload.len(), "FU-A NAL unit truncated");
                return None;
            }
            Some(classify_header((first & 0xE0) | (payload[1] & NAL_TYPE_MASK)))
        }
        _ => parse_nal(payload),
    }
}

/// Whether every `u16` size-prefixed unit fits exactly into `units`.
fn stap_a_lengths_valid(mut units: &[u8]) -> bool {
    while !units.is_empty() {
        if units.len() < 2 {
            return false;
        }
        let size = u16::from_be_bytes([units[0], units[1]]) as usize;
        units = &units[2..];
        if size > units.len() {
            return false;
        }
        units = &units[size..];
    }
    true
}

/// Whether an FU-A payload carries the first fragment of its NAL unit.
pub fn is_fu_a_start(payload: &[u8]) -> bool {
    payload.len() >= FU_A_HEADER_SIZE
        && payload[0] & NAL_TYPE_MASK == NAL_FU_A
        && payload[1] & FU_START_MASK != 0
}

/// Key-frame inspector for H.264 RTP payloads.
///
/// A payload counts as key-frame material when its leading NAL unit is an
/// IDR slice, a parameter set (SPS/PPS) or SEI. Senders emit SPS/PPS and SEI
/// immediately ahead of the IDR, so those packets mark the start of the key
/// frame. FU-A fragments of an IDR count regardless of their start bit.
#[derive(Debug, Clone, Copy, Default)]
pub struct H264Inspector;

impl KeyFrameInspector for H264Inspector {
    fn is_key_frame(&self, buf: &[u8], offset: usize, len: usize) -> bool {
        let Some(payload) = region(buf, offset, len) else {
            return false;
        };
        let Some(info) = leading_nal(payload) else {
            return false;
        };
        // FU-A only ever announces IDR here; parameter sets are never fragmented.
        if payload[0] & NAL_TYPE_MASK == NAL_FU_A {
            return info.nal_type == NAL_IDR;
        }
        matches!(info.nal_type, NAL_IDR | NAL_SPS | NAL_PPS | NAL_SEI)
    }
}
