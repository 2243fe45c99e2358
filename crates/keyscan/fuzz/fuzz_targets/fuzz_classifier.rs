#![no_main]

use keyscan::red::RedBlocks;
use keyscan::{is_key_frame, RtpView};
use libfuzzer_sys::fuzz_target;

/// Fuzz the full classification pipeline.
///
/// The first two bytes choose the RED and codec payload types; the rest is
/// the packet. Classification must never panic, whatever the bytes.
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let red_pt = data[0] & 0x7F;
    let codec_pt = data[1] & 0x7F;
    let packet = &data[2..];
    let view = RtpView::from_slice(packet);

    for name in ["VP8", "H264", "VP9"] {
        let _ = is_key_frame(Some(&view), Some(red_pt), Some(codec_pt), name);
        let _ = is_key_frame(Some(&view), None, Some(codec_pt), name);
    }

    // Every derived length must stay inside the packet.
    if let Ok(header) = view.header_length() {
        assert!(header <= packet.len());
        if let Ok(media) = view.media_length() {
            assert!(header + media <= packet.len());
        }
    }

    if let Some(blocks) = RedBlocks::new(packet, 0, packet.len()) {
        for block in blocks {
            assert!(block.offset + block.length <= packet.len());
        }
    }
});
