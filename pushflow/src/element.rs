// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Elements: independently threaded processing nodes.
//!
//! An [`Element`] owns one worker thread, an execution-state machine and two
//! pin collections. The processing itself is supplied by an
//! [`ElementBehavior`]; the engine only decides when its hooks run.
//!
//! # Push model
//!
//! ```text
//! source.execute()                sink.execute()
//! source.wait_for_execution_state(Idle)
//! out_pin.connect(&in_pin)  ──►   in_pin accepts
//! source.set_state(Play)          sink.set_state(Play)
//!
//! source do_work: send_buffer ──► sink wakes, do_work: try_receive, release
//! source wakes  ◄──────────────── buffer back on out_pin
//!
//! out_pin.disconnect()      ──►   sink forgets the source
//! source.terminate()              sink.terminate()
//! ```
//!
//! # Wake protocol
//!
//! While `Executing`, the worker calls `do_work` and then blocks until a wake
//! is pending. The pending flag is consumed when the block ends, so a wake
//! that arrives while `do_work` is running makes the very next pass run
//! without blocking, and any number of wakes issued before the worker blocks
//! collapse into a single extra pass.

pub mod context;
pub(crate) mod shared;
mod worker;

use std::{
    fmt,
    sync::{Arc, Mutex},
    thread::{self, JoinHandle},
};

use tracing::{Span, error, info, warn};
use uuid::Uuid;

use crate::{
    ElementContext, Error, ExecutionState, InPinCollection, MediaState, OutPinCollection, Result,
    config::ElementConfig, element::shared::ElementShared,
};

/// Hooks an element implementation provides.
///
/// All hooks run on the element's own worker thread. Returning an error from
/// any of them stops the run: the error is logged and recorded as the
/// element's fault, pins are flushed, and the element returns to
/// `WaitingForExecute`. A panicking hook is caught and handled the same way.
pub trait ElementBehavior: Send + 'static {
    /// Called once per `execute`, in `Initializing`. Create pins here.
    fn initialize(&mut self, _context: &ElementContext) -> Result<()> {
        Ok(())
    }

    /// One bounded unit of work. Called repeatedly while `Executing`; must
    /// not block indefinitely. Transient shortages (empty pool, end of
    /// input) should return `Ok` and wait for the next wake.
    fn do_work(&mut self, context: &ElementContext) -> Result<()>;

    /// Called on entry to `Idle`.
    fn idling(&mut self, _context: &ElementContext) -> Result<()> {
        Ok(())
    }

    /// Called when leaving `Idle`.
    fn idled(&mut self, _context: &ElementContext) -> Result<()> {
        Ok(())
    }
}

type Worker = JoinHandle<Box<dyn ElementBehavior>>;

/// An independently threaded pipeline node.
///
/// The handle owns the element: dropping it while the worker is running
/// terminates the worker first.
///
/// # Examples
///
/// ```
/// use pushflow::{Element, ElementBehavior, ElementContext, ExecutionState, MediaState};
///
/// struct Ticker(u64);
///
/// impl ElementBehavior for Ticker {
///     fn do_work(&mut self, _context: &ElementContext) -> pushflow::Result<()> {
///         self.0 += 1;
///         Ok(())
///     }
/// }
///
/// # fn main() -> pushflow::Result<()> {
/// let element = Element::new("ticker", Ticker(0));
/// element.execute()?;
/// element.wait_for_execution_state(ExecutionState::Idle)?;
///
/// element.set_state(MediaState::Play)?;
/// element.wake()?;
/// element.set_state(MediaState::Pause)?;
///
/// element.terminate()?;
/// assert_eq!(element.execution_state()?, ExecutionState::WaitingForExecute);
/// # Ok(())
/// # }
/// ```
pub struct Element {
    shared: Arc<ElementShared>,
    behavior: Mutex<Option<Box<dyn ElementBehavior>>>,
    worker: Mutex<Option<Worker>>,
}

impl Element {
    /// Creates an element in `WaitingForExecute` with logging disabled.
    pub fn new(name: impl Into<String>, behavior: impl ElementBehavior) -> Self {
        Self::from_parts(name.into(), false, Box::new(behavior))
    }

    /// Creates an element named and log-gated according to `config`.
    pub fn with_config(config: &ElementConfig, behavior: impl ElementBehavior) -> Self {
        Self::from_parts(config.name.clone(), config.log_enabled, Box::new(behavior))
    }

    fn from_parts(name: String, log_enabled: bool, behavior: Box<dyn ElementBehavior>) -> Self {
        Self {
            shared: Arc::new(ElementShared::new(name, log_enabled)),
            behavior: Mutex::new(Some(behavior)),
            worker: Mutex::new(None),
        }
    }

    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn log_enabled(&self) -> bool {
        self.shared.log_enabled()
    }

    pub fn set_log_enabled(&self, enabled: bool) {
        self.shared.set_log_enabled(enabled)
    }

    /// Emits `message` at debug level if logging is enabled for this element.
    pub fn log(&self, message: impl fmt::Display) {
        self.shared.log(message)
    }

    pub fn execution_state(&self) -> Result<ExecutionState> {
        self.shared.execution_state()
    }

    pub fn media_state(&self) -> Result<MediaState> {
        self.shared.media_state()
    }

    /// Why the last run stopped, if it stopped on a hook error.
    pub fn fault(&self) -> Result<Option<String>> {
        self.shared.fault()
    }

    pub fn inputs(&self) -> &InPinCollection {
        &self.shared.inputs
    }

    pub fn outputs(&self) -> &OutPinCollection {
        &self.shared.outputs
    }

    /// Starts the worker thread, which initializes the element and parks it
    /// in `Idle`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] unless the element is `WaitingForExecute`
    /// with no live worker. No thread is spawned in that case.
    pub fn execute(&self) -> Result<()> {
        let mut slot = self.worker.lock()?;
        let current = self.shared.execution_state()?;
        if current != ExecutionState::WaitingForExecute {
            return Err(Error::invalid_state(current, ExecutionState::Initializing));
        }
        // A worker that already reset the state has nothing left to do but
        // hand back its behavior.
        if let Some(finished) = slot.take() {
            self.reap(finished)?;
        }

        self.shared.begin_execute()?;
        let Some(behavior) = self.behavior.lock()?.take() else {
            self.shared.finish(None)?;
            return Err(Error::Other(format!(
                "element {} has no behavior to run",
                self.shared.name
            )));
        };

        // The worker logs inside the caller's span.
        let span = Span::current();
        let shared = self.shared.clone();
        let spawned = thread::Builder::new()
            .name(self.shared.name.clone())
            .spawn(move || span.in_scope(|| worker::run(shared, behavior)));
        match spawned {
            Ok(handle) => {
                *slot = Some(handle);
                self.log(format_args!("execute"));
                Ok(())
            }
            Err(err) => {
                self.shared.finish(Some(err.to_string()))?;
                Err(err.into())
            }
        }
    }

    /// Applies play/pause intent. No-op if `state` is already current.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] unless the element is `Executing` or `Idle`.
    pub fn set_state(&self, state: MediaState) -> Result<()> {
        self.shared.change_state(state)
    }

    /// Requests another `do_work` pass. Callable from any thread at any time.
    pub fn wake(&self) -> Result<()> {
        self.shared.wake()
    }

    /// Blocks until the element reaches `target`.
    ///
    /// # Errors
    ///
    /// [`Error::Faulted`] if the worker stopped on a hook error before the
    /// target was reached.
    pub fn wait_for_execution_state(&self, target: ExecutionState) -> Result<()> {
        self.shared.wait_for_execution_state(target)
    }

    /// Discards data queued on every pin of this element.
    pub fn flush(&self) -> Result<()> {
        self.shared.flush()
    }

    /// Stops the worker and joins it.
    ///
    /// Moves to `Terminating`, flushes all pins, wakes the worker out of
    /// whichever wait it is in, and joins it. The worker only exits at one of
    /// its wait points, never in the middle of a hook.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] unless the element is `Executing` or `Idle`
    ///   (so a second call fails)
    /// - [`Error::WorkerPanicked`] if the worker thread died outside a hook
    pub fn terminate(&self) -> Result<()> {
        let mut slot = self.worker.lock()?;
        if slot
            .as_ref()
            .is_some_and(|handle| handle.thread().id() == thread::current().id())
        {
            return Err(Error::Other(format!(
                "element {} cannot terminate itself from its worker thread",
                self.shared.name
            )));
        }

        self.shared.begin_terminate()?;
        let flushed = self.shared.flush();
        self.shared.wake()?;

        let Some(handle) = slot.take() else {
            self.shared.finish(None)?;
            return Err(Error::Other(format!(
                "element {} was running without a worker",
                self.shared.name
            )));
        };
        self.reap(handle)?;
        info!(element = %self.shared.name, "terminated");
        flushed
    }

    /// Joins a worker and takes its behavior back for the next run.
    fn reap(&self, handle: Worker) -> Result<()> {
        match handle.join() {
            Ok(behavior) => {
                *self.behavior.lock()? = Some(behavior);
                Ok(())
            }
            Err(panic) => {
                let message = worker::panic_message(panic.as_ref());
                error!(element = %self.shared.name, "worker panicked: {message}");
                self.shared.finish(Some(message.clone()))?;
                Err(Error::WorkerPanicked(message))
            }
        }
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("id", &self.shared.id)
            .field("name", &self.shared.name)
            .field("execution_state", &self.shared.execution_state().ok())
            .finish_non_exhaustive()
    }
}

impl Drop for Element {
    /// Terminates a running worker; joins one that already stopped.
    fn drop(&mut self) {
        let state = match self.shared.execution_state() {
            Ok(state) => state,
            Err(err) => {
                error!(element = %self.shared.name, "cannot read state on drop: {err}");
                return;
            }
        };
        if state == ExecutionState::Initializing
            && let Err(err) = self.shared.wait_for_execution_state(ExecutionState::Idle)
        {
            warn!(element = %self.shared.name, "initialization did not complete: {err}");
        }
        if self.shared.execution_state().is_ok_and(ExecutionState::is_running) {
            if let Err(err) = self.terminate() {
                error!(element = %self.shared.name, "failed to terminate on drop: {err}");
            }
            return;
        }
        let finished = match self.worker.get_mut() {
            Ok(worker) => worker.take(),
            Err(_) => None,
        };
        if let Some(handle) = finished
            && let Err(err) = self.reap(handle)
        {
            error!(element = %self.shared.name, "failed to join worker on drop: {err}");
        }
    }
}
