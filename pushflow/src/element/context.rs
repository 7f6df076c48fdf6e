// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! The capability handle passed to element hooks.

use std::{fmt, sync::Arc};

use uuid::Uuid;

use crate::{
    Error, ExecutionState, InPin, InPinCollection, OutPin, OutPinCollection, PinInfo, Result,
    element::shared::ElementShared,
};

/// What an element implementation may do to its own element.
///
/// Pins can only be added or cleared before or during `initialize`.
#[derive(Clone)]
pub struct ElementContext {
    shared: Arc<ElementShared>,
}

impl ElementContext {
    pub(crate) fn new(shared: Arc<ElementShared>) -> Self {
        Self { shared }
    }

    pub(crate) fn shared(&self) -> &ElementShared {
        &self.shared
    }

    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn execution_state(&self) -> Result<ExecutionState> {
        self.shared.execution_state()
    }

    pub fn inputs(&self) -> &InPinCollection {
        &self.shared.inputs
    }

    pub fn outputs(&self) -> &OutPinCollection {
        &self.shared.outputs
    }

    /// Creates an input pin owned by this element and appends it.
    pub fn add_input_pin(&self, name: impl Into<String>, info: PinInfo) -> Result<InPin> {
        self.ensure_configurable()?;
        let pin = InPin::with_owner(Arc::downgrade(&self.shared), name, info);
        self.shared.inputs.add(pin.clone())?;
        Ok(pin)
    }

    /// Creates an output pin owned by this element and appends it.
    pub fn add_output_pin(&self, name: impl Into<String>, info: PinInfo) -> Result<OutPin> {
        self.ensure_configurable()?;
        let pin = OutPin::with_owner(Arc::downgrade(&self.shared), name, info);
        self.shared.outputs.add(pin.clone())?;
        Ok(pin)
    }

    pub fn clear_input_pins(&self) -> Result<()> {
        self.ensure_configurable()?;
        self.shared.inputs.clear()
    }

    /// Removes every output pin. Buffers sent through a removed pin are
    /// dropped when released, so reclaim them first.
    pub fn clear_output_pins(&self) -> Result<()> {
        self.ensure_configurable()?;
        self.shared.outputs.clear()
    }

    /// Requests another `do_work` pass.
    pub fn wake(&self) -> Result<()> {
        self.shared.wake()
    }

    /// Emits `message` at debug level if logging is enabled for this element.
    pub fn log(&self, message: impl fmt::Display) {
        self.shared.log(message)
    }

    fn ensure_configurable(&self) -> Result<()> {
        match self.shared.execution_state()? {
            ExecutionState::WaitingForExecute | ExecutionState::Initializing => Ok(()),
            current => Err(Error::invalid_state(current, ExecutionState::Initializing)),
        }
    }
}
