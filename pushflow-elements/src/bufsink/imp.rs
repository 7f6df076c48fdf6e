// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

use pushflow::{Buffer, ElementBehavior, ElementContext, PayloadKind, PinInfo, Result};
use tracing::trace;

/// Sink element behavior handing each received buffer to a callback.
///
/// A callback error stops the element; the buffer that triggered it is
/// still released first.
pub struct CallbackSink<F> {
    kind: PayloadKind,
    pin_name: String,
    callback: F,
}

impl<F> CallbackSink<F>
where
    F: FnMut(&Buffer) -> Result<()> + Send + 'static,
{
    /// Sink with one input pin named after `kind`.
    pub fn new(kind: PayloadKind, callback: F) -> Self {
        Self {
            kind,
            pin_name: kind.to_string(),
            callback,
        }
    }

    /// Overrides the input pin name.
    pub fn with_pin_name(mut self, name: impl Into<String>) -> Self {
        self.pin_name = name.into();
        self
    }
}

impl<F> ElementBehavior for CallbackSink<F>
where
    F: FnMut(&Buffer) -> Result<()> + Send + 'static,
{
    fn initialize(&mut self, context: &ElementContext) -> Result<()> {
        context.clear_input_pins()?;
        context.add_input_pin(self.pin_name.as_str(), PinInfo::new(self.kind))?;
        Ok(())
    }

    fn do_work(&mut self, context: &ElementContext) -> Result<()> {
        for pin in context.inputs().snapshot()? {
            let mut consumed = 0usize;
            while let Some(buffer) = pin.try_receive()? {
                let outcome = (self.callback)(&buffer);
                pin.release(buffer)?;
                outcome?;
                consumed += 1;
            }
            if consumed > 0 {
                trace!(element = %context.name(), consumed, "buffers consumed");
            }
        }
        Ok(())
    }
}
