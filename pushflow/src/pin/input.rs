// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Input pin: the receiving end of a connection.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, Weak},
};

use tracing::{error, trace, warn};
use uuid::Uuid;

use crate::{
    Buffer, Error, PinInfo, Result, SendError,
    element::shared::ElementShared,
    pin::{Pin, output::OutPinShared},
};

pub(crate) struct InPinShared {
    id: Uuid,
    name: String,
    info: PinInfo,
    owner: Weak<ElementShared>,
    source: Mutex<Option<Weak<OutPinShared>>>,
    queue: Mutex<VecDeque<Buffer>>,
}

impl InPinShared {
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Appends a buffer sent by `from`, then wakes the consuming element.
    ///
    /// Fails with [`Error::NotConnected`] if `from` is no longer this pin's
    /// source, handing the buffer back.
    pub(crate) fn enqueue(
        &self,
        from: &Arc<OutPinShared>,
        mut buffer: Buffer,
    ) -> core::result::Result<(), SendError> {
        let source = match self.source.lock() {
            Ok(source) => source,
            Err(error) => return Err(SendError::new(buffer, error.into())),
        };
        let connected = source
            .as_ref()
            .is_some_and(|source| std::ptr::eq(source.as_ptr(), Arc::as_ptr(from)));
        if !connected {
            return Err(SendError::new(buffer, Error::NotConnected));
        }

        buffer.origin = Some(Arc::downgrade(from));
        let queued = match self.queue.lock() {
            Ok(mut queue) => {
                queue.push_back(buffer);
                queue.len()
            }
            Err(error) => return Err(SendError::new(buffer, error.into())),
        };
        drop(source);
        trace!(pin = %self.name, queued, "buffer queued");

        // The buffer is delivered at this point. A wake failure means the
        // sink's own wait condition is poisoned, which its worker reports.
        if let Some(Err(error)) = self.owner.upgrade().map(|owner| owner.wake()) {
            error!(pin = %self.name, "failed to wake sink element: {error}");
        }
        Ok(())
    }

    /// Forgets `source` if it is the current peer.
    pub(crate) fn detach(&self, source: &Arc<OutPinShared>) -> Result<()> {
        let mut slot = self.source.lock()?;
        if slot
            .as_ref()
            .is_some_and(|current| std::ptr::eq(current.as_ptr(), Arc::as_ptr(source)))
        {
            *slot = None;
        }
        Ok(())
    }

    /// Drains the queue and sends every buffer back to where it came from.
    pub(crate) fn flush(&self) -> Result<()> {
        let drained: Vec<Buffer> = self.queue.lock()?.drain(..).collect();
        if !drained.is_empty() {
            trace!(pin = %self.name, count = drained.len(), "flushing queued buffers");
        }
        drained.into_iter().try_for_each(release_to_origin)
    }
}

fn release_to_origin(mut buffer: Buffer) -> Result<()> {
    match buffer.origin.take().and_then(|origin| origin.upgrade()) {
        Some(origin) => origin.return_buffer(buffer),
        None => {
            trace!("buffer origin is gone, dropping buffer");
            Ok(())
        }
    }
}

/// The receiving end of a pin connection.
///
/// Buffers arrive in send order and stay queued until the owning element
/// takes them with [`InPin::try_receive`]. Once consumed, a buffer must be
/// handed back with [`InPin::release`] so its producer can reuse it.
#[derive(Clone)]
pub struct InPin {
    shared: Arc<InPinShared>,
}

impl InPin {
    /// Creates a pin that is not owned by any element.
    pub fn new(name: impl Into<String>, info: PinInfo) -> Self {
        Self::with_owner(Weak::new(), name, info)
    }

    pub(crate) fn with_owner(
        owner: Weak<ElementShared>,
        name: impl Into<String>,
        info: PinInfo,
    ) -> Self {
        Self {
            shared: Arc::new(InPinShared {
                id: Uuid::new_v4(),
                name: name.into(),
                info,
                owner,
                source: Mutex::new(None),
                queue: Mutex::new(VecDeque::new()),
            }),
        }
    }

    pub(crate) fn downgrade(&self) -> Weak<InPinShared> {
        Arc::downgrade(&self.shared)
    }

    /// Whether this pin can take buffers described by `source`.
    pub fn accepts(&self, source: &PinInfo) -> bool {
        source.kind == self.shared.info.kind
    }

    /// Validates and records `source` as this pin's peer.
    ///
    /// Called by [`crate::OutPin::connect`] while it holds its own peer slot.
    pub(crate) fn accept_connection(&self, source: &Arc<OutPinShared>) -> Result<()> {
        if !self.accepts(source.info()) {
            warn!(
                sink = %self.shared.name,
                source = %source.name(),
                "incompatible pin connection rejected"
            );
            return Err(Error::IncompatibleConnection {
                source_kind: source.info().kind,
                sink_kind: self.shared.info.kind,
            });
        }
        let mut slot = self.shared.source.lock()?;
        if slot.as_ref().is_some_and(|current| current.strong_count() > 0) {
            return Err(Error::AlreadyConnected);
        }
        *slot = Some(Arc::downgrade(source));
        Ok(())
    }

    /// Takes the oldest queued buffer.
    pub fn try_receive(&self) -> Result<Option<Buffer>> {
        Ok(self.shared.queue.lock()?.pop_front())
    }

    /// Number of buffers waiting to be consumed.
    pub fn queued(&self) -> Result<usize> {
        Ok(self.shared.queue.lock()?.len())
    }

    /// Hands a consumed buffer back to the pin that sent it.
    ///
    /// The buffer must not be used afterwards. If the sending pin no longer
    /// exists the buffer is dropped.
    pub fn release(&self, buffer: Buffer) -> Result<()> {
        release_to_origin(buffer)
    }
}

impl Pin for InPin {
    fn id(&self) -> Uuid {
        self.shared.id
    }

    fn name(&self) -> &str {
        &self.shared.name
    }

    fn info(&self) -> &PinInfo {
        &self.shared.info
    }

    fn is_connected(&self) -> Result<bool> {
        Ok(self
            .shared
            .source
            .lock()?
            .as_ref()
            .is_some_and(|source| source.strong_count() > 0))
    }

    fn flush(&self) -> Result<()> {
        self.shared.flush()
    }
}

impl std::fmt::Debug for InPin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InPin")
            .field("id", &self.shared.id)
            .field("name", &self.shared.name)
            .field("info", &self.shared.info)
            .finish_non_exhaustive()
    }
}
