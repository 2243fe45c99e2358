//! # RTCP termination contract
//!
//! Shape of a strategy that terminates RTCP at a translator/SFU instead of
//! forwarding it end to end. The three capabilities are independent traits
//! so an integrator can supply any subset; none carries default behavior.

use std::sync::Arc;

use bytes::Bytes;

/// Inspects and optionally rewrites inbound RTCP compound packets.
pub trait RtcpPacketTransformer: Send + Sync {
    /// Returns the packet to forward, or `None` to drop it.
    fn transform(&self, packet: Bytes) -> Option<Bytes>;
}

/// Produces the RTCP feedback this side emits in place of the terminated
/// reports.
pub trait RtcpReportBuilder: Send + Sync {
    fn build_reports(&self) -> Vec<Bytes>;
}

/// The RTP translator (multiplexer) a strategy is attached to.
pub trait RtpTranslator: Send + Sync {
    /// SSRC the translator uses when it originates RTCP itself.
    fn local_ssrc(&self) -> u32;
}

/// Ties the capabilities together for one translator.
pub trait RtcpTerminationStrategy: Send + Sync {
    fn packet_transformer(&self) -> Option<&dyn RtcpPacketTransformer>;

    fn report_builder(&self) -> Option<&dyn RtcpReportBuilder>;

    fn set_translator(&mut self, translator: Arc<dyn RtpTranslator>);
}
