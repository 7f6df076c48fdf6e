// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for pipeline operations.
//!
//! State-machine and connection violations are programmer errors and are
//! reported synchronously. Pool exhaustion is transient: callers poll and
//! retry on the next work pass. Synchronization failures are fatal.

use crate::{Buffer, ExecutionState, PayloadKind};

/// Convenience result type using [`Error`] as the error variant.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors that can occur while driving elements, pins and pools.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The element is not in a state that permits the requested operation.
    ///
    /// Always raised before any state is mutated.
    #[error("Invalid state: {requested} requested while {current}")]
    InvalidState {
        /// State observed when the request was rejected.
        current: ExecutionState,
        /// State (or operation target) that was requested.
        requested: ExecutionState,
    },

    /// The pin has no connected peer.
    #[error("Pin is not connected")]
    NotConnected,

    /// The pin (or its would-be peer) already has a connection.
    #[error("Pin is already connected")]
    AlreadyConnected,

    /// The sink pin does not accept the payload kind of the source pin.
    #[error("Incompatible connection: {source_kind} cannot feed {sink_kind}")]
    IncompatibleConnection {
        /// Payload kind produced by the source pin.
        source_kind: PayloadKind,
        /// Payload kind accepted by the sink pin.
        sink_kind: PayloadKind,
    },

    /// No buffer is available in the pool right now.
    ///
    /// Transient: retry once a buffer has been returned.
    #[error("Buffer pool exhausted")]
    PoolExhausted,

    /// More buffers were returned to a pool than it was created with.
    #[error("Buffer pool overflow (capacity {capacity})")]
    PoolOverflow {
        /// Number of buffers the pool was created with.
        capacity: usize,
    },

    /// A lock or condition variable is no longer usable.
    #[error("Synchronization failure: {0}")]
    SynchronizationFailure(String),

    /// The element's worker stopped because a hook returned an error.
    #[error("Element faulted: {0}")]
    Faulted(String),

    /// The element's worker thread panicked.
    #[error("Worker thread panicked: {0}")]
    WorkerPanicked(String),

    /// A generic error for failures not covered by a dedicated variant.
    #[error("Other error: {0}")]
    Other(String),

    /// I/O failure (thread spawn, file access in readers).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration or descriptor JSON could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns `true` for conditions the work loop should simply retry later.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::PoolExhausted)
    }

    pub(crate) fn invalid_state(current: ExecutionState, requested: ExecutionState) -> Self {
        Error::InvalidState { current, requested }
    }
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(value: std::sync::PoisonError<T>) -> Self {
        Error::SynchronizationFailure(value.to_string())
    }
}

/// A buffer that could not be handed to a sink.
///
/// Ownership of the buffer goes back to the caller, which must recycle it.
#[derive(Debug, thiserror::Error)]
#[error("buffer not sent: {error}")]
pub struct SendError {
    /// The unsent buffer.
    pub buffer: Buffer,
    /// Why the send failed, usually [`Error::NotConnected`].
    #[source]
    pub error: Error,
}

impl SendError {
    pub(crate) fn new(buffer: Buffer, error: Error) -> Self {
        Self { buffer, error }
    }

    /// Recovers the unsent buffer.
    pub fn into_buffer(self) -> Buffer {
        self.buffer
    }
}

impl From<SendError> for Error {
    fn from(value: SendError) -> Self {
        value.error
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn send_error_keeps_its_cause() {
        let err = SendError::new(Buffer::with_capacity(1), Error::NotConnected);
        assert_eq!(err.to_string(), "buffer not sent: Pin is not connected");
        assert!(matches!(
            err.source().and_then(|cause| cause.downcast_ref::<Error>()),
            Some(Error::NotConnected)
        ));
        assert!(matches!(Error::from(err), Error::NotConnected));
    }
}
