// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! State shared between an element handle, its worker thread and its pins.

use std::{
    fmt,
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use tracing::{debug, trace};
use uuid::Uuid;

use crate::{
    Error, ExecutionState, InPinCollection, MediaState, OutPinCollection, Result,
    wait::WaitCondition,
};

/// Execution state plus the reason the last run stopped, if it failed.
#[derive(Debug, Clone)]
pub(crate) struct Lifecycle {
    pub state: ExecutionState,
    pub fault: Option<String>,
}

pub(crate) struct ElementShared {
    pub(crate) id: Uuid,
    pub(crate) name: String,
    log_enabled: AtomicBool,
    /// State-wait: broadcast on every execution state change.
    lifecycle: WaitCondition<Lifecycle>,
    /// Work-wait: sticky "don't sleep" flag for the Executing loop.
    work: WaitCondition<bool>,
    media_state: Mutex<MediaState>,
    pub(crate) inputs: InPinCollection,
    pub(crate) outputs: OutPinCollection,
}

impl ElementShared {
    pub(crate) fn new(name: String, log_enabled: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            log_enabled: AtomicBool::new(log_enabled),
            lifecycle: WaitCondition::new(Lifecycle {
                state: ExecutionState::WaitingForExecute,
                fault: None,
            }),
            work: WaitCondition::new(false),
            media_state: Mutex::new(MediaState::default()),
            inputs: InPinCollection::new(),
            outputs: OutPinCollection::new(),
        }
    }

    pub(crate) fn execution_state(&self) -> Result<ExecutionState> {
        self.lifecycle.with(|lifecycle| lifecycle.state)
    }

    pub(crate) fn fault(&self) -> Result<Option<String>> {
        self.lifecycle.with(|lifecycle| lifecycle.fault.clone())
    }

    pub(crate) fn media_state(&self) -> Result<MediaState> {
        Ok(*self.media_state.lock()?)
    }

    /// Validates `next` against the transition table and applies it.
    ///
    /// Waiters on the state are woken, and so is the work loop so that it
    /// notices the change without waiting for another wake.
    pub(crate) fn set_execution_state(&self, next: ExecutionState) -> Result<()> {
        self.transition(|current| {
            if current.can_transition_to(next) {
                Ok(next)
            } else {
                Err(Error::invalid_state(current, next))
            }
        })
    }

    /// `WaitingForExecute -> Initializing`, clearing any previous fault.
    pub(crate) fn begin_execute(&self) -> Result<()> {
        self.lifecycle
            .update(|lifecycle| {
                let current = lifecycle.state;
                if !current.can_transition_to(ExecutionState::Initializing) {
                    return Err(Error::invalid_state(current, ExecutionState::Initializing));
                }
                lifecycle.state = ExecutionState::Initializing;
                lifecycle.fault = None;
                Ok(())
            })??;
        debug!(element = %self.name, "execution state changed to Initializing");
        Ok(())
    }

    /// `Executing | Idle -> Terminating`.
    pub(crate) fn begin_terminate(&self) -> Result<()> {
        self.transition(|current| {
            if current.is_running() {
                Ok(ExecutionState::Terminating)
            } else {
                Err(Error::invalid_state(current, ExecutionState::Terminating))
            }
        })
    }

    /// Worker teardown: back to `WaitingForExecute`, recording `fault` if the
    /// run failed. Not a table transition.
    pub(crate) fn finish(&self, fault: Option<String>) -> Result<()> {
        *self.media_state.lock()? = MediaState::default();
        self.lifecycle.update(|lifecycle| {
            lifecycle.state = ExecutionState::WaitingForExecute;
            lifecycle.fault = fault;
        })?;
        debug!(element = %self.name, "execution state reset to WaitingForExecute");
        Ok(())
    }

    fn transition(
        &self,
        decide: impl FnOnce(ExecutionState) -> Result<ExecutionState>,
    ) -> Result<()> {
        self.transition_unless_current(|current| decide(current).map(Some))
    }

    /// Like `transition`, but `decide` may return `None` to keep the current
    /// state. Nothing is logged and nobody is woken in that case.
    fn transition_unless_current(
        &self,
        decide: impl FnOnce(ExecutionState) -> Result<Option<ExecutionState>>,
    ) -> Result<()> {
        let changed = self.lifecycle.with_mut(|lifecycle| {
            let from = lifecycle.state;
            let Some(to) = decide(from)? else {
                return Ok(None);
            };
            lifecycle.state = to;
            Ok::<_, Error>(Some((from, to)))
        })??;
        let Some((from, to)) = changed else {
            return Ok(());
        };
        self.lifecycle.notify_all();
        debug!(element = %self.name, %from, %to, "execution state changed");
        self.wake()
    }

    /// Applies caller intent. No-op if `next` is already the media state.
    pub(crate) fn change_state(&self, next: MediaState) -> Result<()> {
        let mut media_state = self.media_state.lock()?;
        if *media_state == next {
            return Ok(());
        }
        let previous = *media_state;
        let target = next.execution_target();
        self.transition_unless_current(|current| {
            if !current.is_running() {
                return Err(Error::invalid_state(current, target));
            }
            Ok((current != target).then_some(target))
        })?;
        *media_state = next;
        debug!(element = %self.name, ?previous, ?next, "media state changed");
        Ok(())
    }

    /// Asks the work loop for another pass.
    pub(crate) fn wake(&self) -> Result<()> {
        self.work.notify()?;
        trace!(element = %self.name, "wake");
        Ok(())
    }

    /// Blocks the worker between `do_work` calls until a wake is pending, and
    /// consumes it. A wake that arrived during `do_work` returns immediately.
    pub(crate) fn wait_for_work(&self) -> Result<()> {
        self.work.wait()
    }

    /// Blocks the worker while the element is `Idle`.
    pub(crate) fn wait_while_idle(&self) -> Result<ExecutionState> {
        self.lifecycle.wait_until(|lifecycle| {
            (lifecycle.state != ExecutionState::Idle).then_some(lifecycle.state)
        })
    }

    /// Blocks until the state equals `target`.
    ///
    /// Returns [`Error::Faulted`] instead if the worker stopped on a hook
    /// error and the target is anything but `WaitingForExecute`.
    pub(crate) fn wait_for_execution_state(&self, target: ExecutionState) -> Result<()> {
        trace!(element = %self.name, %target, "waiting for execution state");
        self.lifecycle.wait_until(|lifecycle| {
            if lifecycle.state == target {
                Some(Ok(()))
            } else {
                lifecycle
                    .fault
                    .as_ref()
                    .filter(|_| lifecycle.state == ExecutionState::WaitingForExecute)
                    .map(|fault| Err(Error::Faulted(fault.clone())))
            }
        })?
    }

    /// Discards data queued on every input and output pin.
    pub(crate) fn flush(&self) -> Result<()> {
        let inputs = self.inputs.flush();
        let outputs = self.outputs.flush();
        self.log(format_args!("flushed"));
        inputs.and(outputs)
    }

    pub(crate) fn log_enabled(&self) -> bool {
        self.log_enabled.load(Ordering::Relaxed)
    }

    pub(crate) fn set_log_enabled(&self, enabled: bool) {
        self.log_enabled.store(enabled, Ordering::Relaxed);
    }

    pub(crate) fn log(&self, message: impl fmt::Display) {
        if self.log_enabled() {
            debug!(element = %self.name, "{message}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle_element() -> ElementShared {
        let shared = ElementShared::new("unit".to_string(), false);
        shared.begin_execute().unwrap();
        shared.set_execution_state(ExecutionState::Idle).unwrap();
        shared.work.wait().unwrap();
        shared
    }

    #[test]
    fn media_change_to_the_current_target_does_not_wake() {
        let shared = idle_element();
        *shared.media_state.lock().unwrap() = MediaState::Play;

        shared.change_state(MediaState::Pause).unwrap();
        assert_eq!(shared.media_state().unwrap(), MediaState::Pause);
        assert_eq!(shared.execution_state().unwrap(), ExecutionState::Idle);
        assert!(!shared.work.get().unwrap());
    }

    #[test]
    fn media_change_to_a_new_target_wakes_the_work_loop() {
        let shared = idle_element();

        shared.change_state(MediaState::Play).unwrap();
        assert_eq!(shared.execution_state().unwrap(), ExecutionState::Executing);
        assert!(shared.work.get().unwrap());
    }
}
