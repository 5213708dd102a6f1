//! Circular sample buffer with a lossy producer and a blocking consumer.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use num::Zero;

use crate::dsp_error::DspError;

struct RingState<T> {
    buffer: Vec<T>,
    /// Write cursor, owned by the producer.
    head: usize,
    /// Read cursor, owned by the consumer.
    tail: usize,
}

/// Single-producer single-consumer sample ring.
///
/// The producer never blocks: appending a window larger than the current
/// vacancy resets the whole ring before the write, preferring freshness over
/// continuity (samples have a real-time value that decays with age). With
/// `allow_overflow = false` the same condition is a hard error instead.
///
/// The consumer blocks until enough samples are available or a timeout
/// elapses, which bounds shutdown latency.
pub struct SampleRing<T> {
    capacity: usize,
    allow_overflow: bool,
    state: Mutex<RingState<T>>,
    occupancy: AtomicUsize,
    readable: Condvar,
}

impl<T: Zero + Copy> SampleRing<T> {
    pub fn new(capacity: usize) -> Result<Self, DspError> {
        Self::with_overflow(capacity, true)
    }

    pub fn with_overflow(capacity: usize, allow_overflow: bool) -> Result<Self, DspError> {
        if capacity == 0 {
            return Err(DspError::InvalidArgument("ring capacity must be greater than zero".to_string()));
        }
        Ok(Self {
            capacity,
            allow_overflow,
            state: Mutex::new(RingState { buffer: vec![T::zero(); capacity], head: 0, tail: 0 }),
            occupancy: AtomicUsize::new(0),
            readable: Condvar::new(),
        })
    }

    fn lock_state(&self) -> MutexGuard<'_, RingState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Used space.
    pub fn occupancy(&self) -> usize {
        self.occupancy.load(Ordering::Acquire)
    }

    /// Space left.
    pub fn vacancy(&self) -> usize {
        self.capacity - self.occupancy()
    }

    /// Snapshot of the backing storage. Use with care.
    pub fn data(&self) -> Vec<T> {
        self.lock_state().buffer.clone()
    }

    /// Reset ring state.
    pub fn reset(&self) {
        let mut state = self.lock_state();
        Self::reset_locked(&mut state, &self.occupancy);
    }

    fn reset_locked(state: &mut RingState<T>, occupancy: &AtomicUsize) {
        state.head = 0;
        state.tail = 0;
        occupancy.store(0, Ordering::Release);
    }

    /// Copy all elements of `buf` into the ring (producer side).
    ///
    /// Fails when `buf` is larger than the whole ring, or larger than the
    /// current vacancy with overflow disallowed.
    pub fn append(&self, buf: &[T]) -> Result<(), DspError> {
        let size = buf.len();
        if size > self.capacity {
            return Err(DspError::InvalidArgument("input buffer is bigger than ring capacity".to_string()));
        }

        let mut state = self.lock_state();

        if size > self.vacancy() {
            if !self.allow_overflow {
                return Err(DspError::Overflow);
            }
            tracing::warn!("overflow");
            Self::reset_locked(&mut state, &self.occupancy);
        }

        let head = state.head;
        let first = size.min(self.capacity - head);
        state.buffer[head..head + first].copy_from_slice(&buf[..first]);
        if first < size {
            state.buffer[..size - first].copy_from_slice(&buf[first..]);
        }

        state.head = (head + size) % self.capacity;
        self.occupancy.fetch_add(size, Ordering::AcqRel);
        self.readable.notify_one();
        Ok(())
    }

    /// Fill `dst` with the oldest samples in the ring (consumer side).
    ///
    /// Blocks until `dst.len()` samples are available. Returns `Ok(false)`
    /// with the ring untouched when the timeout elapses first.
    pub fn popleft(&self, dst: &mut [T], timeout: Duration) -> Result<bool, DspError> {
        let size = dst.len();
        if size > self.capacity {
            return Err(DspError::InvalidArgument("destination is bigger than ring capacity".to_string()));
        }

        let deadline = Instant::now() + timeout;
        let mut state = self.lock_state();

        while self.occupancy() < size {
            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }
            let (guard, _) = self
                .readable
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            state = guard;
        }

        let tail = state.tail;
        let first = size.min(self.capacity - tail);
        dst[..first].copy_from_slice(&state.buffer[tail..tail + first]);
        if first < size {
            dst[first..].copy_from_slice(&state.buffer[..size - first]);
        }

        state.tail = (tail + size) % self.capacity;
        self.occupancy.fetch_sub(size, Ordering::AcqRel);
        Ok(true)
    }
}
