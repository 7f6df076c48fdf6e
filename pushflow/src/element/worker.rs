// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Worker thread body.

use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use tracing::{error, info};

use crate::{
    ElementBehavior, ElementContext, ExecutionState, Result, element::shared::ElementShared,
};

/// Runs one `execute` cycle and hands the behavior back for the next one.
///
/// Entered in `Initializing`; always leaves the element in
/// `WaitingForExecute`, including when a hook panics.
pub(crate) fn run(
    shared: Arc<ElementShared>,
    mut behavior: Box<dyn ElementBehavior>,
) -> Box<dyn ElementBehavior> {
    info!(element = %shared.name, "worker started");
    let context = ElementContext::new(shared.clone());

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| drive(&context, behavior.as_mut())));
    let fault = match outcome {
        Ok(Ok(())) => None,
        Ok(Err(err)) => Some(err.to_string()),
        Err(panic) => Some(format!("hook panicked: {}", panic_message(panic.as_ref()))),
    };
    if let Some(fault) = &fault {
        error!(element = %shared.name, "element stopped: {fault}");
        if let Err(err) = shared.flush() {
            error!(element = %shared.name, "flush after failure: {err}");
        }
    }

    if let Err(err) = shared.finish(fault) {
        error!(element = %shared.name, "failed to reset execution state: {err}");
    }
    info!(element = %shared.name, "worker exited");
    behavior
}

fn drive(context: &ElementContext, behavior: &mut dyn ElementBehavior) -> Result<()> {
    let shared = context.shared();

    behavior.initialize(context)?;
    shared.set_execution_state(ExecutionState::Idle)?;

    loop {
        match shared.execution_state()? {
            ExecutionState::Executing => {
                behavior.do_work(context)?;
                shared.wait_for_work()?;
            }
            ExecutionState::Idle => {
                shared.log(format_args!("idling"));
                behavior.idling(context)?;
                shared.wait_while_idle()?;
                behavior.idled(context)?;
                shared.log(format_args!("resumed from idle"));
            }
            _ => return Ok(()),
        }
    }
}

pub(super) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
