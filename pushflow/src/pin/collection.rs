// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Ordered pin containers owned by an element.

use std::sync::Mutex;

use crate::{InPin, OutPin, Result, pin::Pin};

/// Ordered set of pins, in the order they were added.
///
/// Accessors hand out clones of the pin handles so no lock is held while a
/// caller works with a pin.
#[derive(Debug)]
pub struct PinCollection<P> {
    pins: Mutex<Vec<P>>,
}

/// Input pins of an element.
pub type InPinCollection = PinCollection<InPin>;

/// Output pins of an element.
pub type OutPinCollection = PinCollection<OutPin>;

impl<P> Default for PinCollection<P> {
    fn default() -> Self {
        Self {
            pins: Mutex::new(Vec::new()),
        }
    }
}

impl<P: Pin> PinCollection<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pin.
    pub fn add(&self, pin: P) -> Result<()> {
        self.pins.lock()?.push(pin);
        Ok(())
    }

    /// Removes every pin.
    pub fn clear(&self) -> Result<()> {
        self.pins.lock()?.clear();
        Ok(())
    }

    /// The pin at `index`, if present.
    pub fn get(&self, index: usize) -> Result<Option<P>> {
        Ok(self.pins.lock()?.get(index).cloned())
    }

    /// The first pin named `name`, if present.
    pub fn find(&self, name: &str) -> Result<Option<P>> {
        Ok(self
            .pins
            .lock()?
            .iter()
            .find(|pin| pin.name() == name)
            .cloned())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.pins.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.pins.lock()?.is_empty())
    }

    /// Clones of all pins, in order.
    pub fn snapshot(&self) -> Result<Vec<P>> {
        Ok(self.pins.lock()?.clone())
    }

    /// Flushes every pin.
    ///
    /// Every pin is flushed even if an earlier one fails; the first error is
    /// returned.
    pub fn flush(&self) -> Result<()> {
        self.snapshot()?
            .iter()
            .map(Pin::flush)
            .fold(Ok(()), |first, result| first.and(result))
    }
}
