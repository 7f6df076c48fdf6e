// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Plays a file through a packet source into a byte-counting sink.
//!
//! ```bash
//! cargo run -p pushflow-elements --example play_file -- ./input.bin --chunk-size 4096
//! ```

mod common;

use std::{
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use clap::Parser;
use pushflow::{
    Buffer, Element, ExecutionState, MediaState, PayloadKind, Rational,
    config::{DEFAULT_BUFFER_CAPACITY, ElementConfig},
};
use pushflow_elements::{bufsink, packetsrc::PacketSource, reader::ChunkedFileReader};
use tracing::info;

#[derive(Parser, Debug)]
#[command(version)]
#[command(about = "Push a file through a two-element pipeline and count the bytes")]
struct Args {
    /// File to read
    input: PathBuf,

    /// Bytes per packet
    #[arg(short, long, default_value_t = DEFAULT_BUFFER_CAPACITY)]
    chunk_size: usize,

    /// Source element settings as JSON (see `ElementConfig`)
    #[arg(long)]
    source_config: Option<String>,

    /// Packets per second assumed for timestamps
    #[arg(long, default_value_t = 25)]
    rate: i32,

    /// Enable per-element debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    common::setup_logging(args.verbose);

    let mut source_config = match &args.source_config {
        Some(json) => ElementConfig::from_json(json)?,
        None => ElementConfig::named("file-source"),
    };
    source_config.log_enabled |= args.verbose;
    source_config.buffer_capacity = args.chunk_size;

    let reader = ChunkedFileReader::open(&args.input, args.chunk_size)?
        .with_time_base(Rational::new(1, args.rate));
    let source = PacketSource::new(source_config.clone(), reader);
    let pool = source.pool();
    let status = source.status();
    let source = Element::with_config(&source_config, source);

    let bytes = Arc::new(AtomicU64::new(0));
    let packets = Arc::new(AtomicU64::new(0));
    let sink = {
        let bytes = bytes.clone();
        let packets = packets.clone();
        bufsink::create(
            &ElementConfig::named("byte-counter").with_log_enabled(args.verbose),
            PayloadKind::Data,
            move |buffer: &Buffer| {
                bytes.fetch_add(buffer.len() as u64, Ordering::Relaxed);
                packets.fetch_add(1, Ordering::Relaxed);
                Ok(())
            },
        )
    };

    for element in [&source, &sink] {
        element.execute()?;
        element.wait_for_execution_state(ExecutionState::Idle)?;
    }
    let out = source
        .outputs()
        .find("data")?
        .ok_or("source has no data pin")?;
    let input = sink.inputs().find("data")?.ok_or("sink has no data pin")?;
    out.connect(&input)?;

    let started = Instant::now();
    sink.set_state(MediaState::Play)?;
    source.set_state(MediaState::Play)?;

    while !(status.end_of_stream() && pool.outstanding()? == 0) {
        if let Some(fault) = source.fault()?.or(sink.fault()?) {
            return Err(fault.into());
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    let elapsed = started.elapsed();

    source.set_state(MediaState::Pause)?;
    out.disconnect()?;
    source.terminate()?;
    sink.terminate()?;

    info!(
        packets = packets.load(Ordering::Relaxed),
        bytes = bytes.load(Ordering::Relaxed),
        ?elapsed,
        "playback finished"
    );
    Ok(())
}
