//! Fixed-length sample buffer with scoped acquisition.

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, PoisonError};

use num::Zero;

use crate::dsp_error::DspError;

/// A fixed-length array of samples, zero-filled at construction.
///
/// Contents are mutated through a scoped [`BufferGuard`] which is released on
/// all exit paths. The backing storage and its capacity never change after
/// construction. Locking is always performed internally so a `Buffer` may be
/// shared between threads; the `lock` constructor flag only controls whether
/// the lock is part of the public contract (see [`Buffer::is_locked`]).
pub struct Buffer<T> {
    data: Mutex<Vec<T>>,
    size: usize,
    lock_enabled: bool,
}

impl<T: Zero + Copy> Buffer<T> {
    pub fn new(size: usize, lock: bool) -> Result<Self, DspError> {
        if size == 0 {
            return Err(DspError::InvalidArgument("buffer size must be greater than zero".to_string()));
        }
        Ok(Self {
            data: Mutex::new(vec![T::zero(); size]),
            size,
            lock_enabled: lock,
        })
    }
}

impl<T> Buffer<T> {
    /// Number of elements the buffer holds.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether the buffer is currently held by a guard.
    /// Fails when locking was not enabled at construction.
    pub fn is_locked(&self) -> Result<bool, DspError> {
        if !self.lock_enabled {
            return Err(DspError::InvalidArgument("locking is not enabled in this instance".to_string()));
        }
        Ok(self.data.try_lock().is_err())
    }

    /// Acquire a scoped handle to the backing storage.
    pub fn acquire(&self) -> BufferGuard<'_, T> {
        BufferGuard(self.data.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Scoped view into a [`Buffer`]. Dropping the guard releases the buffer.
pub struct BufferGuard<'a, T>(MutexGuard<'a, Vec<T>>);

impl<T> Deref for BufferGuard<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.0
    }
}

impl<T> DerefMut for BufferGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.0
    }
}
