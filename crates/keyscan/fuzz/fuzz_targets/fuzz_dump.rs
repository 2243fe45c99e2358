#![no_main]

use bytes::Bytes;
use keyscan::dump::Records;
use keyscan::StreamClassifier;
use keyscan::VideoCodec;
use keyscan::config::StreamConfig;
use libfuzzer_sys::fuzz_target;

/// Fuzz the dump reader feeding a stream classifier, as the CLI does.
fuzz_target!(|data: &[u8]| {
    let stream = StreamConfig {
        name: "fuzz".into(),
        codec: VideoCodec::H264,
        payload_type: 107,
        red_payload_type: Some(116),
    };
    let classifier = StreamClassifier::new(&stream);

    for record in Records::new(Bytes::copy_from_slice(data)) {
        match record {
            Ok(packet) => {
                let _ = classifier.classify(&packet);
            }
            Err(_) => break,
        }
    }
});
