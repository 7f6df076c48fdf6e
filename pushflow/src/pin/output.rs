// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Output pin: the sending end of a connection.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, Weak},
};

use tracing::{debug, trace};
use uuid::Uuid;

use crate::{
    Buffer, Error, InPin, PinInfo, Result, SendError,
    element::shared::ElementShared,
    pin::{Pin, input::InPinShared},
};

pub(crate) struct OutPinShared {
    id: Uuid,
    name: String,
    info: PinInfo,
    owner: Weak<ElementShared>,
    peer: Mutex<Option<Weak<InPinShared>>>,
    available: Mutex<VecDeque<Buffer>>,
}

impl OutPinShared {
    /// Takes back a buffer the sink is done with and wakes the owning element
    /// so its work pass can recycle it.
    pub(crate) fn return_buffer(&self, buffer: Buffer) -> Result<()> {
        self.available.lock()?.push_back(buffer);
        trace!(pin = %self.name, "buffer returned by sink");
        match self.owner.upgrade() {
            Some(owner) => owner.wake(),
            None => Ok(()),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn info(&self) -> &PinInfo {
        &self.info
    }

    fn connected_peer(&self) -> Result<Option<Arc<InPinShared>>> {
        Ok(self.peer.lock()?.as_ref().and_then(Weak::upgrade))
    }
}

/// The sending end of a pin connection.
///
/// Cloning yields another handle to the same pin.
///
/// # Examples
///
/// ```
/// use pushflow::{Buffer, InPin, OutPin, PayloadKind, PinInfo};
///
/// # fn main() -> pushflow::Result<()> {
/// let source = OutPin::new("video", PinInfo::new(PayloadKind::Video));
/// let sink = InPin::new("video", PinInfo::new(PayloadKind::Video));
/// source.connect(&sink)?;
///
/// source.send_buffer(Buffer::with_capacity(16))?;
/// let buffer = sink.try_receive()?.expect("queued");
/// sink.release(buffer)?;
///
/// assert!(source.try_get_available_buffer()?.is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct OutPin {
    shared: Arc<OutPinShared>,
}

impl OutPin {
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
            shared: Arc::new(OutPinShared {
                id: Uuid::new_v4(),
                name: name.into(),
                info,
                owner,
                peer: Mutex::new(None),
                available: Mutex::new(VecDeque::new()),
            }),
        }
    }

    /// Connects this pin to `sink`.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyConnected`] if either pin already has a live peer
    /// - [`Error::IncompatibleConnection`] if the payload kinds differ
    pub fn connect(&self, sink: &InPin) -> Result<()> {
        let mut peer = self.shared.peer.lock()?;
        if peer.as_ref().is_some_and(|peer| peer.strong_count() > 0) {
            return Err(Error::AlreadyConnected);
        }
        sink.accept_connection(&self.shared)?;
        *peer = Some(sink.downgrade());
        debug!(source = %self.shared.name, sink = %sink.name(), "pins connected");
        Ok(())
    }

    /// Breaks the connection, telling the sink to forget this source.
    ///
    /// Buffers already queued on the sink stay there and are still routed
    /// back here when released. Disconnecting an unconnected pin is a no-op.
    pub fn disconnect(&self) -> Result<()> {
        let mut peer = self.shared.peer.lock()?;
        if let Some(sink) = peer.take().and_then(|sink| sink.upgrade()) {
            sink.detach(&self.shared)?;
            debug!(source = %self.shared.name, sink = %sink.name(), "pins disconnected");
        }
        Ok(())
    }

    /// Queues `buffer` on the connected sink and wakes the sink's element.
    ///
    /// # Errors
    ///
    /// Returns the buffer inside a [`SendError`] (with
    /// [`Error::NotConnected`]) when there is no live sink. The caller keeps
    /// ownership and must recycle the buffer.
    pub fn send_buffer(&self, buffer: Buffer) -> core::result::Result<(), SendError> {
        let sink = match self.shared.connected_peer() {
            Ok(Some(sink)) => sink,
            Ok(None) => return Err(SendError::new(buffer, Error::NotConnected)),
            Err(error) => return Err(SendError::new(buffer, error)),
        };
        sink.enqueue(&self.shared, buffer)
    }

    /// Pops a buffer the sink has finished with, if any.
    ///
    /// The owning element polls this during its work pass and routes the
    /// buffer back to its pool.
    pub fn try_get_available_buffer(&self) -> Result<Option<Buffer>> {
        Ok(self.shared.available.lock()?.pop_front())
    }

    /// Number of returned buffers waiting to be collected.
    pub fn available_count(&self) -> Result<usize> {
        Ok(self.shared.available.lock()?.len())
    }
}

impl Pin for OutPin {
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
        Ok(self.shared.connected_peer()?.is_some())
    }

    /// Flushes the connected sink's queue; its buffers come back to this
    /// pin's available queue. No acknowledgment from the sink thread is needed.
    fn flush(&self) -> Result<()> {
        if let Some(sink) = self.shared.connected_peer()? {
            sink.flush()?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for OutPin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutPin")
            .field("id", &self.shared.id)
            .field("name", &self.shared.name)
            .field("info", &self.shared.info)
            .finish_non_exhaustive()
    }
}
