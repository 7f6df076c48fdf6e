// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Packet Source Element
//!
//! A source element that reads packets from a [`crate::reader::PacketReader`]
//! and pushes them downstream in pooled buffers.
//!
//! ## Responsibilities
//! - Creates one output pin per payload kind, for the first stream of that kind
//! - Fills buffers from its own pool and stamps them with the stream timing
//! - Retires buffers that come back from consumers
//! - Stops reading at end of input and keeps reclaiming buffers afterwards
//!
//! ## Pins
//! Pins are named after their payload kind: `video`, `audio`, `subtitle`,
//! `data`. Streams beyond the first of each kind are read and discarded.

use pushflow::{Element, config::ElementConfig};

/// Core implementation (pin setup, work pass)
mod imp;

/// Routing table and progress counters
mod state;

pub use imp::PacketSource;
pub use state::SourceStatus;

use crate::reader::PacketReader;

/// Creates a source element for `reader`.
///
/// Returns the element together with a status handle that reports progress
/// from any thread.
pub fn create<R: PacketReader>(config: &ElementConfig, reader: R) -> (Element, SourceStatus) {
    let source = PacketSource::new(config.clone(), reader);
    let status = source.status();
    (Element::with_config(config, source), status)
}
