//! # keyscan
//!
//! Stateless key-frame detection for RTP video packets.
//!
//! Given one packet and the codec in use, decide whether the packet carries
//! the start of a key frame, either directly or as the primary block of a
//! RED (RFC 2198) wrapper. Every failure path answers `false`; no input can
//! make classification panic.
//!
//! ## Crate structure
//!
//! - [`rtp`]: Bounds-checked RTP envelope reader
//! - [`red`]: RED primary block extraction
//! - [`vp8`]: VP8 payload descriptor / key frame inspector
//! - [`h264`]: H.264 NAL unit inspector (single NAL, STAP-A, FU-A)
//! - [`classifier`]: Orchestrates the above per codec
//! - [`termination`]: RTCP termination strategy contract
//! - [`config`]: TOML stream configuration
//! - [`dump`]: Length-prefixed packet dump reader/writer

pub mod classifier;
pub mod codec;
pub mod config;
pub mod dump;
pub mod error;
pub mod h264;
pub mod inspector;
pub mod red;
pub mod rtp;
pub mod termination;
pub mod vp8;

pub use classifier::{is_key_frame, KeyFrameClassifier, StreamClassifier};
pub use codec::VideoCodec;
pub use inspector::KeyFrameInspector;
pub use red::{RedBlock, RedundancyUnwrapper};
pub use rtp::RtpView;
