//! End-to-end classification scenarios over hand-built RTP packets.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use keyscan::red::Rfc2198;
use keyscan::{is_key_frame, KeyFrameClassifier, KeyFrameInspector, RedBlock, RtpView};
use keyscan::{RedundancyUnwrapper, VideoCodec};

const VP8_PT: u8 = 100;
const H264_PT: u8 = 107;
const RED_PT: u8 = 116;

// ─── Helpers ─────────────────────────────────────────────────────────────────

struct PacketBuilder {
    pt: u8,
    csrcs: Vec<u32>,
    extension: Option<Vec<u8>>,
    payload: Vec<u8>,
    padding: u8,
}

impl PacketBuilder {
    fn new(pt: u8, payload: &[u8]) -> Self {
        Self {
            pt,
            csrcs: Vec::new(),
            extension: None,
            payload: payload.to_vec(),
            padding: 0,
        }
    }

    fn csrcs(mut self, csrcs: &[u32]) -> Self {
        self.csrcs = csrcs.to_vec();
        self
    }

    /// One-byte-header extension body, padded to a word boundary.
    fn extension(mut self, body: &[u8]) -> Self {
        let mut body = body.to_vec();
        while body.len() % 4 != 0 {
            body.push(0);
        }
        self.extension = Some(body);
        self
    }

    fn padding(mut self, count: u8) -> Self {
        self.padding = count;
        self
    }

    fn build(self) -> Vec<u8> {
        let mut b0 = 0x80 | self.csrcs.len() as u8;
        if self.padding > 0 {
            b0 |= 0x20;
        }
        if self.extension.is_some() {
            b0 |= 0x10;
        }
        let mut pkt = vec![b0, self.pt, 0x12, 0x34, 0, 0, 0x0b, 0xb8, 0xde, 0xad, 0xbe, 0xef];
        for csrc in &self.csrcs {
            pkt.extend_from_slice(&csrc.to_be_bytes());
        }
        if let Some(ext) = &self.extension {
            pkt.extend_from_slice(&[0xbe, 0xde]);
            pkt.extend_from_slice(&((ext.len() / 4) as u16).to_be_bytes());
            pkt.extend_from_slice(ext);
        }
        pkt.extend_from_slice(&self.payload);
        if self.padding > 0 {
            pkt.extend(std::iter::repeat_n(0u8, self.padding as usize - 1));
            pkt.push(self.padding);
        }
        pkt
    }
}

/// RED payload: optional redundant block, then the primary block.
fn red_payload(secondary: Option<(u8, &[u8])>, primary_pt: u8, primary: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    if let Some((pt, data)) = secondary {
        let word = (1u32 << 31) | ((pt as u32) << 24) | (90 << 10) | data.len() as u32;
        out.extend_from_slice(&word.to_be_bytes());
    }
    out.push(primary_pt);
    if let Some((_, data)) = secondary {
        out.extend_from_slice(data);
    }
    out.extend_from_slice(primary);
    out
}

/// VP8 key frame: descriptor S=1 PID=0, payload header P=0.
const VP8_KEY: [u8; 7] = [0x10, 0x50, 0x2a, 0x00, 0x9d, 0x01, 0x2a];
const VP8_DELTA: [u8; 4] = [0x10, 0x31, 0x0b, 0x00];
const H264_IDR: [u8; 3] = [0x65, 0x88, 0x84];
const H264_P: [u8; 3] = [0x41, 0x9a, 0x02];

#[derive(Clone, Default)]
struct Recorder {
    calls: Arc<AtomicUsize>,
    regions: Arc<Mutex<Vec<(usize, usize)>>>,
}

impl Recorder {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn regions(&self) -> Vec<(usize, usize)> {
        self.regions.lock().unwrap().clone()
    }
}

/// Wraps a real inspector and records every region it is handed.
#[derive(Clone)]
struct Spy<I> {
    inner: I,
    recorder: Recorder,
}

impl<I: KeyFrameInspector> KeyFrameInspector for Spy<I> {
    fn is_key_frame(&self, buf: &[u8], offset: usize, len: usize) -> bool {
        self.recorder.calls.fetch_add(1, Ordering::SeqCst);
        self.recorder.regions.lock().unwrap().push((offset, len));
        self.inner.is_key_frame(buf, offset, len)
    }
}

fn spied() -> (KeyFrameClassifier, Recorder, Recorder) {
    let vp8 = Recorder::default();
    let h264 = Recorder::default();
    let classifier = KeyFrameClassifier::new()
        .with_vp8_inspector(Spy {
            inner: keyscan::vp8::Vp8Inspector,
            recorder: vp8.clone(),
        })
        .with_h264_inspector(Spy {
            inner: keyscan::h264::H264Inspector,
            recorder: h264.clone(),
        });
    (classifier, vp8, h264)
}

// ─── Plain packets ───────────────────────────────────────────────────────────

#[test]
fn vp8_key_frame_after_fixed_header() {
    let pkt = PacketBuilder::new(VP8_PT, &VP8_KEY).build();
    let view = RtpView::from_slice(&pkt);
    assert!(is_key_frame(Some(&view), None, Some(VP8_PT), "VP8"));
}

#[test]
fn same_vp8_packet_classified_as_h264() {
    let (classifier, vp8, h264) = spied();
    let pkt = PacketBuilder::new(VP8_PT, &VP8_KEY).build();
    let view = RtpView::from_slice(&pkt);

    assert!(!classifier.is_key_frame(Some(&view), None, Some(H264_PT), "H264"));
    assert_eq!(vp8.calls(), 0);
    assert_eq!(h264.calls(), 0);
}

#[test]
fn vp8_delta_frame() {
    let pkt = PacketBuilder::new(VP8_PT, &VP8_DELTA).build();
    let view = RtpView::from_slice(&pkt);
    assert!(!is_key_frame(Some(&view), None, Some(VP8_PT), "VP8"));
}

#[test]
fn h264_idr_and_p_slice() {
    let idr = PacketBuilder::new(H264_PT, &H264_IDR).build();
    let p = PacketBuilder::new(H264_PT, &H264_P).build();
    assert!(is_key_frame(
        Some(&RtpView::from_slice(&idr)),
        None,
        Some(H264_PT),
        "h264"
    ));
    assert!(!is_key_frame(
        Some(&RtpView::from_slice(&p)),
        None,
        Some(H264_PT),
        "H264"
    ));
}

#[test]
fn inspector_sees_header_end_to_padding_start() {
    let (classifier, vp8, _) = spied();
    let pkt = PacketBuilder::new(VP8_PT, &VP8_KEY)
        .csrcs(&[1, 2])
        .extension(&[0x22, 0xaa, 0x36])
        .padding(4)
        .build();
    let view = RtpView::from_slice(&pkt);

    assert!(classifier.is_key_frame(Some(&view), None, Some(VP8_PT), "VP8"));
    // 12 fixed + 8 CSRC + 4 extension preamble + 4 extension body
    assert_eq!(vp8.regions(), vec![(28, VP8_KEY.len())]);
}

#[test]
fn packet_inside_larger_buffer() {
    let (classifier, vp8, _) = spied();
    let pkt = PacketBuilder::new(VP8_PT, &VP8_KEY).build();
    let mut buf = vec![0xFF; 32];
    buf.extend_from_slice(&pkt);
    buf.extend_from_slice(&[0xFF; 16]);

    let view = RtpView::new(&buf, 32, pkt.len()).unwrap();
    assert!(classifier.is_key_frame(Some(&view), None, Some(VP8_PT), "VP8"));
    assert_eq!(vp8.regions(), vec![(44, VP8_KEY.len())]);
}

/// The H.264 inspector gets the payload without trailing padding, the same
/// region VP8 gets.
#[test]
fn h264_region_excludes_padding_like_vp8() {
    let (classifier, _, h264) = spied();
    let pkt = PacketBuilder::new(H264_PT, &H264_IDR).padding(8).build();
    let view = RtpView::from_slice(&pkt);

    assert!(classifier.is_key_frame(Some(&view), None, Some(H264_PT), "H264"));
    assert_eq!(h264.regions(), vec![(12, H264_IDR.len())]);
}

#[test]
fn h264_stap_a_with_parameter_sets() {
    let stap = [0x78, 0x00, 0x02, 0x67, 0x42, 0x00, 0x02, 0x68, 0xce];
    let pkt = PacketBuilder::new(H264_PT, &stap).build();
    let view = RtpView::from_slice(&pkt);
    assert!(is_key_frame(Some(&view), None, Some(H264_PT), "H264"));
}

// ─── RED ─────────────────────────────────────────────────────────────────────

#[test]
fn red_wrapped_vp8_key_frame() {
    let (classifier, vp8, _) = spied();
    let payload = red_payload(Some((VP8_PT, &VP8_DELTA)), VP8_PT, &VP8_KEY);
    let pkt = PacketBuilder::new(RED_PT, &payload).build();
    let view = RtpView::from_slice(&pkt);

    assert!(classifier.is_key_frame(Some(&view), Some(RED_PT), Some(VP8_PT), "VP8"));
    // 12 header + 4 secondary header + 1 primary header + 4 secondary data
    assert_eq!(vp8.regions(), vec![(21, VP8_KEY.len())]);
}

#[test]
fn red_wrapped_h264_key_frame() {
    let payload = red_payload(None, H264_PT, &H264_IDR);
    let pkt = PacketBuilder::new(RED_PT, &payload).build();
    let view = RtpView::from_slice(&pkt);
    assert!(is_key_frame(Some(&view), Some(RED_PT), Some(H264_PT), "H264"));
}

#[test]
fn red_wrapped_stap_a_ignores_padding() {
    let (classifier, _, h264) = spied();
    let stap = [0x78, 0x00, 0x02, 0x67, 0x42, 0x00, 0x02, 0x68, 0xce];
    let plain = PacketBuilder::new(H264_PT, &stap).padding(4).build();
    let red = PacketBuilder::new(RED_PT, &red_payload(None, H264_PT, &stap))
        .padding(4)
        .build();

    assert!(classifier.is_key_frame(
        Some(&RtpView::from_slice(&plain)),
        Some(RED_PT),
        Some(H264_PT),
        "H264"
    ));
    assert!(classifier.is_key_frame(
        Some(&RtpView::from_slice(&red)),
        Some(RED_PT),
        Some(H264_PT),
        "H264"
    ));
    // 12 header, then 1 primary header for the RED packet.
    assert_eq!(h264.regions(), vec![(12, stap.len()), (13, stap.len())]);
}

#[test]
fn red_primary_of_another_codec_is_not_inspected() {
    let (classifier, vp8, _) = spied();
    let payload = red_payload(None, 96, &VP8_KEY);
    let pkt = PacketBuilder::new(RED_PT, &payload).build();
    let view = RtpView::from_slice(&pkt);

    assert!(!classifier.is_key_frame(Some(&view), Some(RED_PT), Some(VP8_PT), "VP8"));
    assert_eq!(vp8.calls(), 0);
}

#[test]
fn red_packet_without_red_payload_type_configured() {
    let payload = red_payload(None, VP8_PT, &VP8_KEY);
    let pkt = PacketBuilder::new(RED_PT, &payload).build();
    let view = RtpView::from_slice(&pkt);
    assert!(!is_key_frame(Some(&view), None, Some(VP8_PT), "VP8"));
}

#[test]
fn red_configured_but_packet_is_plain() {
    let pkt = PacketBuilder::new(VP8_PT, &VP8_KEY).build();
    let view = RtpView::from_slice(&pkt);
    assert!(is_key_frame(Some(&view), Some(RED_PT), Some(VP8_PT), "VP8"));
}

#[test]
fn red_with_overrunning_secondary_block() {
    let (classifier, vp8, _) = spied();
    let mut payload = red_payload(Some((VP8_PT, &VP8_DELTA)), VP8_PT, &VP8_KEY);
    payload[3] = 0xFF; // secondary length far past the payload
    let pkt = PacketBuilder::new(RED_PT, &payload).build();
    let view = RtpView::from_slice(&pkt);

    assert!(!classifier.is_key_frame(Some(&view), Some(RED_PT), Some(VP8_PT), "VP8"));
    assert_eq!(vp8.calls(), 0);
}

/// An unwrapper that reports a block past the end of the buffer.
struct Lying;

impl RedundancyUnwrapper for Lying {
    fn primary_block(&self, buf: &[u8], _offset: usize, _length: usize) -> Option<RedBlock> {
        Some(RedBlock {
            offset: buf.len() - 1,
            length: 64,
            payload_type: VP8_PT,
            timestamp_offset: 0,
            is_primary: true,
        })
    }
}

#[test]
fn primary_block_beyond_buffer() {
    let vp8 = Recorder::default();
    let classifier = KeyFrameClassifier::new()
        .with_unwrapper(Lying)
        .with_vp8_inspector(Spy {
            inner: keyscan::vp8::Vp8Inspector,
            recorder: vp8.clone(),
        });
    let pkt = PacketBuilder::new(RED_PT, &[VP8_PT]).build();
    let view = RtpView::from_slice(&pkt);

    assert!(!classifier.is_key_frame(Some(&view), Some(RED_PT), Some(VP8_PT), "VP8"));
    assert_eq!(vp8.calls(), 0);
}

#[test]
fn default_unwrapper_is_rfc2198() {
    let payload = red_payload(None, VP8_PT, &VP8_KEY);
    let pkt = PacketBuilder::new(RED_PT, &payload).build();
    let view = RtpView::from_slice(&pkt);
    let block = Rfc2198
        .primary_block(&pkt, view.payload_offset().unwrap(), view.payload_length().unwrap())
        .unwrap();
    assert_eq!(block.offset, 13);
    assert_eq!(block.length, VP8_KEY.len());
}

// ─── Failure paths ───────────────────────────────────────────────────────────

#[test]
fn absent_packet_never_inspects() {
    let (classifier, vp8, h264) = spied();
    assert!(!classifier.is_key_frame(None, Some(RED_PT), Some(VP8_PT), "VP8"));
    assert!(!classifier.is_codec_key_frame(None, None, Some(H264_PT), VideoCodec::H264));
    assert_eq!(vp8.calls() + h264.calls(), 0);
}

#[test]
fn unsupported_codec_never_inspects() {
    let (classifier, vp8, h264) = spied();
    let pkt = PacketBuilder::new(VP8_PT, &VP8_KEY).build();
    let view = RtpView::from_slice(&pkt);
    for name in ["VP9", "AV1", "", "H265", "vp8 ", " VP8\t"] {
        assert!(
            !classifier.is_key_frame(Some(&view), None, Some(VP8_PT), name),
            "{name:?}"
        );
    }
    assert_eq!(vp8.calls() + h264.calls(), 0);
}

#[test]
fn truncated_packets() {
    let pkt = PacketBuilder::new(VP8_PT, &VP8_KEY).build();
    for len in 0..12 {
        let view = RtpView::from_slice(&pkt[..len]);
        assert!(!is_key_frame(Some(&view), None, Some(VP8_PT), "VP8"), "len {len}");
    }
}

#[test]
fn extension_length_past_buffer() {
    let mut pkt = PacketBuilder::new(VP8_PT, &VP8_KEY).extension(&[1]).build();
    pkt[14] = 0x40; // extension claims 16384 words
    let view = RtpView::from_slice(&pkt);
    assert!(!is_key_frame(Some(&view), None, Some(VP8_PT), "VP8"));
}

#[test]
fn padding_count_past_payload() {
    let mut pkt = PacketBuilder::new(VP8_PT, &VP8_KEY).padding(1).build();
    *pkt.last_mut().unwrap() = 200;
    let view = RtpView::from_slice(&pkt);
    assert!(!is_key_frame(Some(&view), None, Some(VP8_PT), "VP8"));
}

#[test]
fn repeated_calls_agree() {
    let pkt = PacketBuilder::new(VP8_PT, &VP8_KEY).build();
    let view = RtpView::from_slice(&pkt);
    let first = is_key_frame(Some(&view), None, Some(VP8_PT), "VP8");
    for _ in 0..8 {
        assert_eq!(is_key_frame(Some(&view), None, Some(VP8_PT), "VP8"), first);
    }
}

#[test]
fn shared_across_threads() {
    let pkt = Arc::new(PacketBuilder::new(VP8_PT, &VP8_KEY).build());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let pkt = Arc::clone(&pkt);
            std::thread::spawn(move || {
                let view = RtpView::from_slice(&pkt);
                (0..100).all(|_| is_key_frame(Some(&view), None, Some(VP8_PT), "VP8"))
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
