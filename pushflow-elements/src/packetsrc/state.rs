// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Runtime state of a packet source.

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use pushflow::{OutPin, Rational};

/// Where packets of one stream go.
#[derive(Debug, Clone)]
pub(crate) struct Route {
    /// Output pin, or `None` for streams that are read and discarded.
    pub pin: Option<OutPin>,
    /// Time base of the stream's timestamps.
    pub time_base: Rational,
}

/// Per-run state, rebuilt by `initialize`.
#[derive(Debug, Default)]
pub(crate) struct State {
    /// One route per reader stream, indexed like the reader's stream list.
    pub routes: Vec<Route>,
}

#[derive(Debug, Default)]
struct Progress {
    end_of_stream: AtomicBool,
    packets_sent: AtomicU64,
    packets_dropped: AtomicU64,
}

/// Observer handle on a running source.
///
/// Cloned out of the source before it is moved into an element so other
/// threads can tell when the input has been exhausted.
#[derive(Debug, Clone, Default)]
pub struct SourceStatus {
    progress: Arc<Progress>,
}

impl SourceStatus {
    /// Whether the reader reported end of input.
    pub fn end_of_stream(&self) -> bool {
        self.progress.end_of_stream.load(Ordering::Acquire)
    }

    /// Packets handed to a connected pin.
    pub fn packets_sent(&self) -> u64 {
        self.progress.packets_sent.load(Ordering::Relaxed)
    }

    /// Packets read but discarded because nothing was connected for them.
    pub fn packets_dropped(&self) -> u64 {
        self.progress.packets_dropped.load(Ordering::Relaxed)
    }

    pub(crate) fn set_end_of_stream(&self, reached: bool) {
        self.progress.end_of_stream.store(reached, Ordering::Release);
    }

    pub(crate) fn record_sent(&self) {
        self.progress.packets_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.progress.packets_dropped.fetch_add(1, Ordering::Relaxed);
    }
}
