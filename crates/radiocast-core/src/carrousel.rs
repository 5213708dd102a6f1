//! Fixed rotation of pre-allocated buffers with enqueue/dequeue handles.

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, PoisonError};

use num::Zero;

use crate::buffer::{Buffer, BufferGuard};
use crate::dsp_error::DspError;

struct CarrouselState {
    head: usize,
    tail: usize,
    occupancy: usize,
    overflows: u64,
}

/// A ring of owned, identically-sized [`Buffer`] slots.
///
/// Unlike a queue, slots are never deallocated after a dequeue; the same
/// pre-allocated memory rotates between writer and reader, so the hot path
/// never allocates. Writing into a full carrousel drops the oldest slot and
/// counts an overflow instead of blocking.
///
/// Single producer and single consumer by contract; concurrent enqueues (or
/// concurrent dequeues) are not supported.
pub struct Carrousel<T> {
    slots: Vec<Buffer<T>>,
    state: Mutex<CarrouselState>,
}

impl<T: Zero + Copy> Carrousel<T> {
    pub fn new(slot_count: usize, slot_size: usize) -> Result<Self, DspError> {
        if slot_count == 0 {
            return Err(DspError::InvalidArgument("carrousel needs at least one slot".to_string()));
        }
        let mut slots = Vec::with_capacity(slot_count);
        for _ in 0..slot_count {
            slots.push(Buffer::new(slot_size, true)?);
        }
        Ok(Self {
            slots,
            state: Mutex::new(CarrouselState { head: 0, tail: 0, occupancy: 0, overflows: 0 }),
        })
    }
}

impl<T> Carrousel<T> {
    fn lock_state(&self) -> MutexGuard<'_, CarrouselState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Total number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots written but not yet read.
    pub fn occupancy(&self) -> usize {
        self.lock_state().occupancy
    }

    /// Number of oldest-slot drops since construction.
    pub fn overflows(&self) -> u64 {
        self.lock_state().overflows
    }

    pub fn is_empty(&self) -> bool {
        self.occupancy() == 0
    }

    pub fn is_full(&self) -> bool {
        self.occupancy() >= self.capacity()
    }

    /// Whether it is safe to start reading.
    pub fn is_healthy(&self) -> bool {
        self.occupancy() >= 1
    }

    /// Rewind cursors to the initial state. Overflow count is kept.
    pub fn reset(&self) {
        let mut state = self.lock_state();
        state.head = 0;
        state.tail = 0;
        state.occupancy = 0;
    }

    /// Scoped handle to the next writable slot.
    ///
    /// When the carrousel is full the oldest unread slot is dropped first.
    /// The write cursor advances when the handle is released.
    pub fn enqueue(&self) -> SlotWriteGuard<'_, T> {
        let index = {
            let mut state = self.lock_state();
            if state.occupancy >= self.slots.len() {
                state.overflows += 1;
                state.occupancy -= 1;
                state.head = (state.head + 1) % self.slots.len();
                tracing::warn!("overflow");
            }
            state.tail
        };
        SlotWriteGuard { ring: self, view: self.slots[index].acquire() }
    }

    /// Scoped handle to the oldest readable slot.
    ///
    /// The read cursor advances when the handle is released.
    pub fn dequeue(&self) -> Result<SlotReadGuard<'_, T>, DspError> {
        let index = {
            let state = self.lock_state();
            if state.occupancy == 0 {
                return Err(DspError::Empty);
            }
            state.head
        };
        Ok(SlotReadGuard { ring: self, view: self.slots[index].acquire() })
    }
}

/// Writable view of a carrousel slot.
pub struct SlotWriteGuard<'a, T> {
    ring: &'a Carrousel<T>,
    view: BufferGuard<'a, T>,
}

impl<T> Deref for SlotWriteGuard<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.view
    }
}

impl<T> DerefMut for SlotWriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.view
    }
}

impl<T> Drop for SlotWriteGuard<'_, T> {
    fn drop(&mut self) {
        let mut state = self.ring.lock_state();
        state.occupancy += 1;
        state.tail = (state.tail + 1) % self.ring.slots.len();
    }
}

/// Read-only view of a carrousel slot.
pub struct SlotReadGuard<'a, T> {
    ring: &'a Carrousel<T>,
    view: BufferGuard<'a, T>,
}

impl<T> Deref for SlotReadGuard<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.view
    }
}

impl<T> Drop for SlotReadGuard<'_, T> {
    fn drop(&mut self) {
        let mut state = self.ring.lock_state();
        state.occupancy -= 1;
        state.head = (state.head + 1) % self.ring.slots.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let ring = Carrousel::<f32>::new(3, 1).unwrap();
        assert_eq!(ring.occupancy(), 0);
        assert_eq!(ring.capacity(), 3);
        assert!(ring.is_empty());
        assert!(!ring.is_healthy());

        for value in 1..=3 {
            let mut slot = ring.enqueue();
            slot[0] = value as f32;
        }
        assert!(ring.is_full());
        assert!(ring.is_healthy());

        for expected in 1..=3 {
            let slot = ring.dequeue().unwrap();
            assert_eq!(slot[0], expected as f32);
        }
        assert_eq!(ring.occupancy(), 0);
        assert_eq!(ring.overflows(), 0);
        assert!(ring.dequeue().is_err());
    }

    #[test]
    fn test_overflow_drops_oldest() {
        let ring = Carrousel::<f32>::new(3, 1).unwrap();

        for value in 1..=4 {
            let mut slot = ring.enqueue();
            slot[0] = value as f32;
        }
        assert_eq!(ring.occupancy(), 3);
        assert_eq!(ring.overflows(), 1);

        for expected in 2..=4 {
            let slot = ring.dequeue().unwrap();
            assert_eq!(slot[0], expected as f32);
        }
        assert!(ring.is_empty());
    }

    #[test]
    fn test_reset_rewinds_cursors() {
        let ring = Carrousel::<f32>::new(2, 4).unwrap();
        {
            let mut slot = ring.enqueue();
            slot.fill(1.0);
        }
        ring.reset();
        assert!(ring.is_empty());
        assert!(ring.dequeue().is_err());
    }
}
