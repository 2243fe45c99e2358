//! # keyscan
//!
//! Scans a length-prefixed RTP packet dump and reports which packets start
//! a key frame.
//!
//! ## Usage
//!
//! ```bash
//! # Stream described on the command line
//! keyscan --input capture.bin --codec VP8 --payload-type 100 --red-payload-type 116
//!
//! # Stream taken from a config file
//! keyscan --input capture.bin --config keyscan.toml --stream camera
//!
//! # Machine-readable summary
//! keyscan --input capture.bin --codec H264 --payload-type 107 --json
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context};
use bytes::Bytes;
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use keyscan::config::{KeyscanConfig, StreamConfig};
use keyscan::dump::Records;
use keyscan::{RtpView, StreamClassifier, VideoCodec};

/// Key-frame scanner for RTP packet dumps.
#[derive(Parser, Debug)]
#[command(name = "keyscan", about = "Find key frames in an RTP packet dump")]
struct Cli {
    /// Packet dump (u16 big-endian length + packet, repeated).
    #[arg(long)]
    input: PathBuf,

    /// TOML config describing the streams.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stream name in the config (defaults to the first stream).
    #[arg(long)]
    stream: Option<String>,

    /// Codec name; overrides the config.
    #[arg(long)]
    codec: Option<String>,

    /// Codec payload type; overrides the config.
    #[arg(long)]
    payload_type: Option<u8>,

    /// RED payload type; overrides the config.
    #[arg(long)]
    red_payload_type: Option<u8>,

    /// Print the summary as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Debug, Default, Serialize)]
struct Summary {
    stream: String,
    codec: String,
    packets: u64,
    key_frames: u64,
    malformed_records: u64,
    first_key_frame: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    // ── Logging ─────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .compact()
        .init();

    let cli = Cli::parse();
    let stream = resolve_stream(&cli)?;

    tracing::info!(
        input = %cli.input.display(),
        stream = %stream.name,
        codec = %stream.codec,
        payload_type = stream.payload_type,
        red_payload_type = ?stream.red_payload_type,
        "keyscan starting"
    );

    let data = std::fs::read(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;
    let classifier = StreamClassifier::new(&stream);

    let mut summary = Summary {
        stream: stream.name.clone(),
        codec: stream.codec.to_string(),
        ..Default::default()
    };

    for (index, record) in Records::new(Bytes::from(data)).enumerate() {
        let packet = match record {
            Ok(packet) => packet,
            Err(e) => {
                tracing::warn!(error = %e, "stopping at malformed record");
                summary.malformed_records += 1;
                break;
            }
        };
        summary.packets += 1;

        let view = RtpView::from_slice(&packet);
        if !classifier.classify_view(&view) {
            continue;
        }

        summary.key_frames += 1;
        summary.first_key_frame.get_or_insert(index as u64);
        if !cli.json {
            println!(
                "{index}\tseq={}\tts={}",
                view.sequence_number().unwrap_or_default(),
                view.timestamp().unwrap_or_default()
            );
        }
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "{} packets, {} key frames ({} malformed)",
            summary.packets, summary.key_frames, summary.malformed_records
        );
    }

    tracing::info!(
        packets = summary.packets,
        key_frames = summary.key_frames,
        "keyscan finished"
    );
    Ok(())
}

/// Pick the stream from the config (if any) and apply command-line overrides.
fn resolve_stream(cli: &Cli) -> anyhow::Result<StreamConfig> {
    let config = match &cli.config {
        Some(path) => KeyscanConfig::from_file(path)?,
        None => KeyscanConfig::default(),
    };

    let base = match &cli.stream {
        Some(name) => Some(
            config
                .stream(name)
                .with_context(|| format!("no stream named {name:?} in config"))?
                .clone(),
        ),
        None => config.streams.first().cloned(),
    };

    let codec = cli.codec.as_deref().map(VideoCodec::from_name);
    let stream = match (base, codec, cli.payload_type) {
        (Some(mut stream), codec, pt) => {
            if let Some(codec) = codec {
                stream.codec = codec;
            }
            if let Some(pt) = pt {
                stream.payload_type = pt;
            }
            if cli.red_payload_type.is_some() {
                stream.red_payload_type = cli.red_payload_type;
            }
            stream
        }
        (None, Some(codec), Some(payload_type)) => StreamConfig {
            name: "cli".into(),
            codec,
            payload_type,
            red_payload_type: cli.red_payload_type,
        },
        (None, _, _) => bail!("no stream configured: pass --config or --codec and --payload-type"),
    };

    if stream.payload_type > 127 || stream.red_payload_type.is_some_and(|pt| pt > 127) {
        bail!("payload types must be in 0..=127");
    }
    if !stream.codec.is_supported() {
        tracing::warn!(
            codec = cli.codec.as_deref().unwrap_or_default(),
            "codec is not supported, no packet will be reported as a key frame"
        );
    }

    Ok(stream)
}
