// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Connection endpoints between elements.
//!
//! ```text
//!  source element thread               sink element thread
//!  ─────────────────────               ───────────────────
//!  OutPin::connect(&in_pin)  ───────►  accept_connection (kind check)
//!
//!  OutPin::send_buffer(b)    ───────►  queue ──► InPin::try_receive()
//!                                                   │
//!  OutPin::try_get_available_buffer() ◄── InPin::release(b)
//!
//!  OutPin::disconnect()      ───────►  sink forgets its source
//! ```
//!
//! Each pin's queue is guarded by its own mutex; no lock is shared between
//! elements. Locks are always taken in the order source peer slot, sink
//! source slot, sink queue, and the available queue of an output pin is only
//! ever locked on its own.

pub mod collection;
pub mod input;
pub mod output;

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Rational, Result};

/// Broad category of the payload carried over a pin.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PayloadKind {
    /// Compressed or raw video.
    Video,
    /// Compressed or raw audio.
    Audio,
    /// Subtitle or caption packets.
    Subtitle,
    /// Anything else.
    Data,
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PayloadKind::Video => "video",
            PayloadKind::Audio => "audio",
            PayloadKind::Subtitle => "subtitle",
            PayloadKind::Data => "data",
        };
        f.write_str(name)
    }
}

/// Description of what a pin carries.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PinInfo {
    /// Payload category; connected pins must agree on it.
    pub kind: PayloadKind,
    /// Time base of buffer timestamps, when the producer knows it.
    #[serde(default)]
    pub time_base: Option<Rational>,
}

impl PinInfo {
    /// Pin info with no time base.
    pub fn new(kind: PayloadKind) -> Self {
        Self {
            kind,
            time_base: None,
        }
    }

    /// Sets the time base.
    pub fn with_time_base(mut self, time_base: Rational) -> Self {
        self.time_base = Some(time_base);
        self
    }
}

/// Behaviour shared by input and output pins.
pub trait Pin: Clone + Send + Sync {
    /// Unique pin identity.
    fn id(&self) -> Uuid;

    /// Name given when the pin was created.
    fn name(&self) -> &str;

    /// What the pin carries.
    fn info(&self) -> &PinInfo;

    /// Whether a live peer is attached.
    fn is_connected(&self) -> Result<bool>;

    /// Discards queued, not yet consumed buffers.
    fn flush(&self) -> Result<()>;
}
