// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Buffer payload and timing metadata.

use std::{fmt, sync::Weak};

use serde::{Deserialize, Serialize};

use crate::pin::output::OutPinShared;

/// Rational number used as a timestamp time base (e.g. 1/90000).
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rational {
    /// Numerator of the ratio.
    pub numerator: i32,
    /// Denominator of the ratio.
    pub denominator: i32,
}

impl Rational {
    /// Creates a new ratio.
    pub const fn new(numerator: i32, denominator: i32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// The ratio as a float, or `None` if the denominator is zero.
    pub fn to_f64(self) -> Option<f64> {
        (self.denominator != 0).then(|| f64::from(self.numerator) / f64::from(self.denominator))
    }

    /// Converts a tick count in this time base to seconds.
    pub fn ticks_to_seconds(self, ticks: i64) -> Option<f64> {
        self.to_f64().map(|seconds_per_tick| seconds_per_tick * ticks as f64)
    }
}

impl Default for Rational {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// A unit of payload data exchanged over pins.
///
/// The payload is opaque to the engine; only producers and consumers
/// interpret it.
pub struct Buffer {
    data: Vec<u8>,
    timestamp: Option<f64>,
    time_base: Rational,
    /// Pin that sent this buffer; released buffers are routed back to it.
    pub(crate) origin: Option<Weak<OutPinShared>>,
}

impl Buffer {
    /// Creates an empty buffer that can hold `capacity` bytes without reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            timestamp: None,
            time_base: Rational::default(),
            origin: None,
        }
    }

    /// Payload bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable payload storage; producers resize and fill it directly.
    pub fn data_mut(&mut self) -> &mut Vec<u8> {
        &mut self.data
    }

    /// Replaces the payload with a copy of `bytes`.
    pub fn set_payload(&mut self, bytes: &[u8]) {
        self.data.clear();
        self.data.extend_from_slice(bytes);
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// `true` if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Presentation time in seconds, if known.
    pub fn timestamp(&self) -> Option<f64> {
        self.timestamp
    }

    pub fn set_timestamp(&mut self, seconds: f64) {
        self.timestamp = Some(seconds);
    }

    /// Time base the timestamp was derived from.
    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    pub fn set_time_base(&mut self, time_base: Rational) {
        self.time_base = time_base;
    }

    /// Clears payload length, timing and routing so the buffer can be reused.
    ///
    /// The payload allocation is kept.
    pub fn reset(&mut self) {
        self.data.clear();
        self.timestamp = None;
        self.time_base = Rational::default();
        self.origin = None;
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("len", &self.data.len())
            .field("timestamp", &self.timestamp)
            .field("time_base", &self.time_base)
            .finish()
    }
}
