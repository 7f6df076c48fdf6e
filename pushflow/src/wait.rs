// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Notify-with-memory wait primitive.
//!
//! A [`WaitCondition`] pairs a mutex-protected value with a condition
//! variable. Writers mutate the value and broadcast; readers block until a
//! predicate over the value holds. Since the predicate is evaluated under the
//! same lock the writer mutates, a notification can never slip in between
//! the check and the block.

use std::sync::{Condvar, Mutex, MutexGuard};

use crate::Result;

/// A value that threads can wait on until it satisfies a predicate.
#[derive(Debug, Default)]
pub struct WaitCondition<T> {
    value: Mutex<T>,
    signal: Condvar,
}

impl<T> WaitCondition<T> {
    /// Creates a condition holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            value: Mutex::new(value),
            signal: Condvar::new(),
        }
    }

    /// Applies `f` under the lock, then wakes every waiter.
    ///
    /// Waiters are woken even if `f` made no change.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R> {
        let mut guard = self.lock()?;
        let result = f(&mut *guard);
        drop(guard);
        self.signal.notify_all();
        Ok(result)
    }

    /// Blocks until `ready` returns `Some`, and returns that value.
    ///
    /// `ready` runs under the lock and may mutate the value, which is how a
    /// sticky flag gets consumed exactly once.
    pub fn wait_until<R>(&self, mut ready: impl FnMut(&mut T) -> Option<R>) -> Result<R> {
        let mut guard = self.lock()?;
        loop {
            if let Some(result) = ready(&mut *guard) {
                return Ok(result);
            }
            guard = self.signal.wait(guard)?;
        }
    }

    /// Reads the value through `f` without notifying anyone.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Result<R> {
        Ok(f(&*self.lock()?))
    }

    /// Applies `f` under the lock without notifying anyone.
    ///
    /// Pair with [`WaitCondition::notify_all`] once the change is known to
    /// matter.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R> {
        Ok(f(&mut *self.lock()?))
    }

    /// Wakes every waiter so it re-checks its predicate.
    pub fn notify_all(&self) {
        self.signal.notify_all();
    }

    fn lock(&self) -> Result<MutexGuard<'_, T>> {
        Ok(self.value.lock()?)
    }
}

impl<T: Clone> WaitCondition<T> {
    /// Returns a copy of the current value.
    pub fn get(&self) -> Result<T> {
        self.with(T::clone)
    }
}

impl WaitCondition<bool> {
    /// Sets the sticky flag and wakes all waiters.
    pub fn notify(&self) -> Result<()> {
        self.update(|pending| *pending = true)
    }

    /// Blocks until the flag is set, then clears it.
    ///
    /// A notification delivered before this call returns immediately, so an
    /// early wake is never lost; several early wakes collapse into one.
    pub fn wait(&self) -> Result<()> {
        self.wait_until(|pending| std::mem::take(pending).then_some(()))
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread, time::Duration};

    use super::WaitCondition;

    #[test]
    fn notify_before_wait_is_not_lost() {
        let signal = WaitCondition::new(false);
        signal.notify().unwrap();
        signal.notify().unwrap();
        signal.wait().unwrap();
        assert!(!signal.get().unwrap());
    }

    #[test]
    fn waiter_sees_update_from_other_thread() {
        let cell = Arc::new(WaitCondition::new(0u32));
        let writer = {
            let cell = cell.clone();
            thread::spawn(move || {
                for _ in 0..5 {
                    thread::sleep(Duration::from_millis(2));
                    cell.update(|value| *value += 1).unwrap();
                }
            })
        };
        let seen = cell.wait_until(|value| (*value >= 5).then_some(*value)).unwrap();
        assert_eq!(seen, 5);
        writer.join().unwrap();
    }
}
