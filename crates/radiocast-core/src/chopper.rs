//! Helper to divide a big array into equal-size contiguous chunks.

use std::slice::{ChunksExact, ChunksExactMut};

use crate::dsp_error::DspError;

/// Splits an array of `size` elements into `size / chunk_size` views.
///
/// Useful when an array sized for processing has to be populated from
/// smaller device reads, or vice versa. Carries no state.
#[derive(Debug, Clone, Copy)]
pub struct Chopper {
    size: usize,
    chunk_size: usize,
}

impl Chopper {
    pub fn new(size: usize, chunk_size: usize) -> Result<Self, DspError> {
        if chunk_size == 0 || size % chunk_size != 0 {
            return Err(DspError::InvalidArgument(format!(
                "cannot evenly divide array by chunk size ({}, {})",
                size, chunk_size
            )));
        }
        Ok(Self { size, chunk_size })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Iterate over non-overlapping chunks of the input.
    pub fn chop<'a, T>(&self, input: &'a [T]) -> Result<ChunksExact<'a, T>, DspError> {
        if input.len() != self.size {
            return Err(DspError::SizeMismatch { expected: self.size, actual: input.len() });
        }
        Ok(input.chunks_exact(self.chunk_size))
    }

    /// Iterate over non-overlapping mutable chunks of the input.
    pub fn chop_mut<'a, T>(&self, input: &'a mut [T]) -> Result<ChunksExactMut<'a, T>, DspError> {
        if input.len() != self.size {
            return Err(DspError::SizeMismatch { expected: self.size, actual: input.len() });
        }
        Ok(input.chunks_exact_mut(self.chunk_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uneven_division_rejected() {
        assert!(Chopper::new(10, 3).is_err());
        assert!(Chopper::new(10, 0).is_err());
        assert!(Chopper::new(10, 5).is_ok());
    }

    #[test]
    fn test_concatenation_equals_input() {
        let chopper = Chopper::new(12, 4).unwrap();
        let input: Vec<u32> = (0..12).collect();

        let chunks: Vec<&[u32]> = chopper.chop(&input).unwrap().collect();
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.len() == 4));

        let concat: Vec<u32> = chunks.concat();
        assert_eq!(concat, input);
    }

    #[test]
    fn test_write_through_mutates_original() {
        let chopper = Chopper::new(8, 2).unwrap();
        let mut data = [0.0f32; 8];

        for (i, chunk) in chopper.chop_mut(&mut data).unwrap().enumerate() {
            chunk.fill(i as f32);
        }
        assert_eq!(data, [0.0, 0.0, 1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let chopper = Chopper::new(8, 2).unwrap();
        let data = [0.0f32; 6];
        assert!(chopper.chop(&data).is_err());
    }
}
