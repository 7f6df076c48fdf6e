// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Bounded buffer pool.
//!
//! A pool is filled once at construction and never grows: the number of
//! buffers available in the pool plus those in flight on pins plus those held
//! by the producer stays equal to [`BufferPool::capacity`]. This is what
//! bounds pin queues and gives the pipeline its backpressure: a producer that
//! finds the pool empty has to wait for consumers to release buffers.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use tracing::trace;

use crate::{Buffer, Error, Result};

struct PoolInner {
    capacity: usize,
    buffer_capacity: usize,
    available: Mutex<VecDeque<Buffer>>,
}

/// A fixed-size set of reusable buffers.
///
/// Cloning the pool yields another handle to the same buffers.
///
/// # Examples
///
/// ```
/// use pushflow::BufferPool;
///
/// # fn main() -> pushflow::Result<()> {
/// let pool = BufferPool::new(2, 1024);
/// let mut buffer = pool.try_pop()?;
/// buffer.set_payload(b"frame");
/// assert_eq!(pool.outstanding()?, 1);
///
/// pool.push(buffer)?;
/// assert_eq!(pool.available()?, 2);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BufferPool {
    inner: Arc<PoolInner>,
}

impl BufferPool {
    /// Creates a pool of `capacity` buffers, each preallocated with
    /// `buffer_capacity` bytes.
    pub fn new(capacity: usize, buffer_capacity: usize) -> Self {
        let available = (0..capacity)
            .map(|_| Buffer::with_capacity(buffer_capacity))
            .collect();
        Self {
            inner: Arc::new(PoolInner {
                capacity,
                buffer_capacity,
                available: Mutex::new(available),
            }),
        }
    }

    /// Takes a buffer out of the pool.
    ///
    /// # Errors
    ///
    /// [`Error::PoolExhausted`] if every buffer is in use. This is transient;
    /// retry after a buffer has been returned.
    pub fn try_pop(&self) -> Result<Buffer> {
        self.inner
            .available
            .lock()?
            .pop_front()
            .ok_or(Error::PoolExhausted)
    }

    /// Returns a buffer to the pool, resetting its payload first.
    ///
    /// # Errors
    ///
    /// [`Error::PoolOverflow`] if the pool is already full, which means the
    /// buffer did not come from this pool.
    pub fn push(&self, mut buffer: Buffer) -> Result<()> {
        buffer.reset();
        let mut available = self.inner.available.lock()?;
        if available.len() >= self.inner.capacity {
            return Err(Error::PoolOverflow {
                capacity: self.inner.capacity,
            });
        }
        available.push_back(buffer);
        trace!(available = available.len(), "buffer returned to pool");
        Ok(())
    }

    /// Drops a used buffer and puts a freshly allocated one in its slot.
    ///
    /// Use this instead of [`Self::push`] when the old payload allocation
    /// should be released rather than reused.
    pub fn retire(&self, buffer: Buffer) -> Result<()> {
        drop(buffer);
        self.push(Buffer::with_capacity(self.inner.buffer_capacity))
    }

    /// Number of buffers the pool was created with.
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Number of buffers currently in the pool.
    pub fn available(&self) -> Result<usize> {
        Ok(self.inner.available.lock()?.len())
    }

    /// Number of buffers currently out of the pool (in flight or being filled).
    pub fn outstanding(&self) -> Result<usize> {
        Ok(self.inner.capacity - self.available()?)
    }
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("capacity", &self.inner.capacity)
            .field("buffer_capacity", &self.inner.buffer_capacity)
            .finish_non_exhaustive()
    }
}
