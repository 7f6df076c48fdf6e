// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Source and sink elements for pushflow pipelines.
//!
//! This crate provides concrete [`pushflow::ElementBehavior`] implementations:
//!
//! - **packetsrc**: A source element that reads packets from a
//!   [`reader::PacketReader`] and pushes them out, one output pin per payload kind
//! - **bufsink**: A sink element that hands every received buffer to a callback
//!
//! ## Readers
//! - [`reader::MemoryReader`]: replays packets queued in memory
//! - [`reader::ChunkedFileReader`]: splits a file into fixed-size data packets
//!
//! Streams are described by [`streamdef::StreamDef`], which can also be
//! loaded from JSON.
//!
//! ## Example Pipeline
//! ```no_run
//! use pushflow::{ExecutionState, MediaState, PayloadKind, config::ElementConfig};
//! use pushflow_elements::{bufsink, packetsrc, reader::ChunkedFileReader};
//!
//! # fn main() -> pushflow::Result<()> {
//! let reader = ChunkedFileReader::open("input.bin", 4096)?;
//! let (source, status) = packetsrc::create(&ElementConfig::named("file"), reader);
//! let sink = bufsink::create(&ElementConfig::named("sink"), PayloadKind::Data, |buffer| {
//!     println!("{} bytes", buffer.len());
//!     Ok(())
//! });
//!
//! for element in [&source, &sink] {
//!     element.execute()?;
//!     element.wait_for_execution_state(ExecutionState::Idle)?;
//! }
//! let out = source.outputs().find("data")?.expect("data pin");
//! let input = sink.inputs().find("data")?.expect("data pin");
//! out.connect(&input)?;
//! sink.set_state(MediaState::Play)?;
//! source.set_state(MediaState::Play)?;
//! # let _ = status;
//! # Ok(())
//! # }
//! ```

/// Sink element (calls back with each received buffer)
pub mod bufsink;

/// Source element (reads packets, pushes pooled buffers)
pub mod packetsrc;

/// Packet readers used by the source element
pub mod reader;

/// Stream descriptors
pub mod streamdef;
