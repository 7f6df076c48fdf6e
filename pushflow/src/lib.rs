// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! # pushflow
//!
//! The core of a push-model media pipeline: independently threaded elements
//! that exchange pooled payload buffers through connected pins.
//!
//! ## Overview
//!
//! Every [`Element`] runs its own worker thread. Producers fill buffers
//! from a [`BufferPool`] and push them out through an [`OutPin`]; the
//! connected [`InPin`] queues them and wakes the consuming element. When the
//! consumer releases a buffer it travels back to the output pin it came
//! from, whose element is woken in turn so it can produce again.
//!
//! ### Key Concepts
//!
//! - **Element**: A processing node with one worker thread ([`Element`], [`ElementBehavior`])
//! - **Execution state**: Where the worker is in its lifecycle ([`ExecutionState`])
//! - **Media state**: Caller intent, play or pause ([`MediaState`])
//! - **Pin**: A connection endpoint ([`InPin`], [`OutPin`]) grouped in a [`PinCollection`]
//! - **Buffer**: A pooled payload with timing ([`Buffer`], [`BufferPool`])
//! - **Wait condition**: The notify-with-memory primitive the worker sleeps on ([`WaitCondition`])
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐   send_buffer    ┌──────────────────┐
//! │ source element   │ ───────────────► │ sink element     │
//! │  BufferPool      │     OutPin ─► InPin                 │
//! │  worker thread   │ ◄─────────────── │  worker thread   │
//! └──────────────────┘     release      └──────────────────┘
//! ```
//!
//! ## Examples
//!
//! ```
//! use pushflow::{
//!     Buffer, Element, ElementBehavior, ElementContext, ExecutionState, MediaState,
//!     PayloadKind, PinInfo,
//! };
//!
//! struct Drain;
//!
//! impl ElementBehavior for Drain {
//!     fn initialize(&mut self, context: &ElementContext) -> pushflow::Result<()> {
//!         context.add_input_pin("in", PinInfo::new(PayloadKind::Data))?;
//!         Ok(())
//!     }
//!
//!     fn do_work(&mut self, context: &ElementContext) -> pushflow::Result<()> {
//!         for pin in context.inputs().snapshot()? {
//!             while let Some(buffer) = pin.try_receive()? {
//!                 pin.release(buffer)?;
//!             }
//!         }
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> pushflow::Result<()> {
//! let sink = Element::new("drain", Drain);
//! sink.execute()?;
//! sink.wait_for_execution_state(ExecutionState::Idle)?;
//! sink.set_state(MediaState::Play)?;
//!
//! let out = pushflow::OutPin::new("out", PinInfo::new(PayloadKind::Data));
//! let input = sink.inputs().find("in")?.expect("pin created in initialize");
//! out.connect(&input)?;
//! out.send_buffer(Buffer::with_capacity(16))?;
//! out.disconnect()?;
//!
//! sink.terminate()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Thread Safety
//!
//! - [`Element`] is `Send + Sync`; every control operation may be called
//!   from any thread
//! - Pins are cheap `Clone` handles to shared state and are `Send + Sync`
//! - A [`Buffer`] is owned by exactly one party at a time

mod buffer;
mod element;
mod error;
mod pin;
mod state;
mod wait;

pub mod config;

pub use buffer::{data::Buffer, data::Rational, pool::BufferPool};
pub use element::{Element, ElementBehavior, context::ElementContext};
pub use error::{Error, Result, SendError};
pub use pin::{
    Pin, PayloadKind, PinInfo,
    collection::{InPinCollection, OutPinCollection, PinCollection},
    input::InPin,
    output::OutPin,
};
pub use state::{ExecutionState, MediaState};
pub use wait::WaitCondition;
