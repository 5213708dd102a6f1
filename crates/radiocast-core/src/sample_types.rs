//! Data types used for signal processing

use num_complex;

pub type RealSample = f32;
pub use std::f32::consts as sample_consts;

/// Complex baseband sample (I/Q pair).
pub type ComplexSample = num_complex::Complex<RealSample>;

/// Demodulated audio sample, nominally in [-1, 1].
pub type AudioSample = f32;

pub type SampleCount = i64;
