// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Callback Sink Element
//!
//! A sink element with a single input pin. Every buffer that arrives is
//! passed to a user callback in arrival order and then released back to the
//! element that produced it.

use pushflow::{Buffer, Element, PayloadKind, Result, config::ElementConfig};

/// Core implementation (pin setup, work pass)
mod imp;

pub use imp::CallbackSink;

/// Creates a sink element accepting `kind` that calls `callback` per buffer.
pub fn create<F>(config: &ElementConfig, kind: PayloadKind, callback: F) -> Element
where
    F: FnMut(&Buffer) -> Result<()> + Send + 'static,
{
    Element::with_config(config, CallbackSink::new(kind, callback))
}
